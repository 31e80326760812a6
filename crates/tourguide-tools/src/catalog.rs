//! Tool catalog exposed to the model

use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tourguide_llm::{ToolDefinition, ToolSpec};

/// Every tool the assistant may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetCurrentDate,
    SearchTours,
    GetSearchStatus,
    GetSearchResults,
    GetDictionaries,
    ActualizeTour,
    GetTourDetails,
    GetHotelInfo,
    GetHotTours,
    ContinueSearch,
}

impl ToolName {
    /// All tools, in catalog order
    pub const ALL: [ToolName; 10] = [
        Self::GetCurrentDate,
        Self::SearchTours,
        Self::GetSearchStatus,
        Self::GetSearchResults,
        Self::GetDictionaries,
        Self::ActualizeTour,
        Self::GetTourDetails,
        Self::GetHotelInfo,
        Self::GetHotTours,
        Self::ContinueSearch,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetCurrentDate => "get_current_date",
            Self::SearchTours => "search_tours",
            Self::GetSearchStatus => "get_search_status",
            Self::GetSearchResults => "get_search_results",
            Self::GetDictionaries => "get_dictionaries",
            Self::ActualizeTour => "actualize_tour",
            Self::GetTourDetails => "get_tour_details",
            Self::GetHotelInfo => "get_hotel_info",
            Self::GetHotTours => "get_hot_tours",
            Self::ContinueSearch => "continue_search",
        }
    }

    /// Whether results of this tool deserve the longer replay summary budget
    #[must_use]
    pub fn is_result_bearing(&self) -> bool {
        matches!(
            self,
            Self::GetSearchResults | Self::GetHotelInfo | Self::GetHotTours
        )
    }

    /// Schema shown to the model
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        let (description, parameters) = match self {
            Self::GetCurrentDate => (
                "Текущая дата и время. Вызывай перед расчётом datefrom/dateto.",
                object(json!({}), &[]),
            ),
            Self::SearchTours => (
                "Запуск асинхронного поиска туров. Возвращает requestid. \
                 Вызывай только когда клиент назвал город вылета, даты, состав и пожелания к отелю.",
                object(
                    json!({
                        "departure": int("Код города вылета (get_dictionaries type=departure)"),
                        "country": int("Код страны (get_dictionaries type=country)"),
                        "datefrom": text("Начало окна дат ВЫЛЕТА, ДД.ММ.ГГГГ"),
                        "dateto": text("Конец окна дат ВЫЛЕТА (не дата возвращения), ДД.ММ.ГГГГ"),
                        "nightsfrom": int("Минимум ночей (по умолчанию 7)"),
                        "nightsto": int("Максимум ночей (по умолчанию 10)"),
                        "adults": int("Взрослых (по умолчанию 2)"),
                        "child": int("Детей"),
                        "childage1": int("Возраст первого ребёнка"),
                        "childage2": int("Возраст второго ребёнка"),
                        "childage3": int("Возраст третьего ребёнка"),
                        "stars": int("Категория отеля от 1 до 5"),
                        "starsbetter": int("1 — категория и выше"),
                        "meal": int("Код питания (get_dictionaries type=meal)"),
                        "mealbetter": int("1 — питание и лучше"),
                        "rating": int("Минимальный рейтинг отеля"),
                        "hotels": text("Коды отелей через запятую"),
                        "hoteltypes": text("Типы отелей через запятую"),
                        "regions": text("Коды курортов через запятую"),
                        "subregions": text("Коды подрегионов через запятую"),
                        "operators": text("Коды туроператоров через запятую"),
                        "pricefrom": int("Цена от"),
                        "priceto": int("Цена до"),
                        "pricetype": int("0 — за номер, 1 — за человека"),
                        "services": text("Коды услуг через запятую"),
                        "onrequest": int("0 — все, 1 — без туров под запрос"),
                        "directflight": int("1 — только прямые перелёты"),
                        "flightclass": text("Класс перелёта"),
                        "currency": int("0 — рубли, 1 — у.е."),
                        "hideregular": int("1 — скрыть регулярные рейсы")
                    }),
                    &["departure", "country", "datefrom", "dateto"],
                ),
            ),
            Self::GetSearchStatus => (
                "Дождаться результатов поиска. Сам ждёт до 60 секунд, вызывай один раз.",
                object(json!({"requestid": text("Идентификатор поиска")}), &["requestid"]),
            ),
            Self::GetSearchResults => (
                "Результаты поиска. Карточки отелей показываются клиенту автоматически.",
                object(
                    json!({
                        "requestid": text("Идентификатор поиска"),
                        "page": int("Страница (по умолчанию 1)"),
                        "onpage": int("Отелей на странице (по умолчанию 10)"),
                        "operatorstatus": int("1 — добавить статусы операторов"),
                        "nodescription": int("1 — без описаний отелей")
                    }),
                    &["requestid"],
                ),
            ),
            Self::GetDictionaries => (
                "Справочники: departure, country, region, subregion, meal, stars, operator, \
                 services, flydate, hotel, currency.",
                object(
                    json!({
                        "type": text("Тип справочника"),
                        "cndep": int("Город вылета для списка стран"),
                        "regcountry": int("Страна для списка курортов"),
                        "flydeparture": int("Город вылета для операторов и дат"),
                        "flycountry": int("Страна для операторов и дат"),
                        "hotcountry": int("Страна для списка отелей"),
                        "hotregion": int("Курорт для списка отелей"),
                        "hotstars": int("Категория для списка отелей"),
                        "hotrating": int("Рейтинг для списка отелей"),
                        "hotactive": int("1 — активный отдых"),
                        "hotrelax": int("1 — спокойный отдых"),
                        "hotfamily": int("1 — семейный"),
                        "hothealth": int("1 — лечебный"),
                        "hotcity": int("1 — городской"),
                        "hotbeach": int("1 — пляжный"),
                        "hotdeluxe": int("1 — люкс"),
                        "name": text("Часть названия отеля")
                    }),
                    &["type"],
                ),
            ),
            Self::ActualizeTour => (
                "Актуализировать цену и наличие тура.",
                object(
                    json!({
                        "tourid": text("Идентификатор тура"),
                        "request": int("Режим запроса (по умолчанию 2)"),
                        "currency": int("0 — рубли, 1 — у.е.")
                    }),
                    &["tourid"],
                ),
            ),
            Self::GetTourDetails => (
                "Детали тура: рейсы, доплаты, состав.",
                object(
                    json!({
                        "tourid": text("Идентификатор тура"),
                        "currency": int("0 — рубли, 1 — у.е.")
                    }),
                    &["tourid"],
                ),
            ),
            Self::GetHotelInfo => (
                "Подробное описание отеля, фото и отзывы.",
                object(
                    json!({
                        "hotelcode": text("Код отеля"),
                        "reviews": int("1 — добавить отзывы")
                    }),
                    &["hotelcode"],
                ),
            ),
            Self::GetHotTours => (
                "Горящие туры. Цены указаны за человека.",
                object(
                    json!({
                        "city": int("Город вылета"),
                        "items": int("Количество туров (по умолчанию 10)"),
                        "city2": int("Второй город вылета"),
                        "city3": int("Третий город вылета"),
                        "uniq2": int("Уникальность по второму городу"),
                        "uniq3": int("Уникальность по третьему городу"),
                        "countries": text("Коды стран через запятую"),
                        "regions": text("Коды курортов через запятую"),
                        "operators": text("Коды операторов через запятую"),
                        "datefrom": text("Вылет с, ДД.ММ.ГГГГ"),
                        "dateto": text("Вылет по, ДД.ММ.ГГГГ"),
                        "stars": int("Категория отеля"),
                        "meal": int("Код питания"),
                        "rating": int("Минимальный рейтинг"),
                        "maxdays": int("Максимум ночей"),
                        "tourtype": int("Тип тура"),
                        "visa": int("1 — только безвизовые"),
                        "sort": int("1 — сортировка по цене"),
                        "picturetype": int("Размер картинок"),
                        "currency": int("0 — рубли, 1 — у.е.")
                    }),
                    &["city"],
                ),
            ),
            Self::ContinueSearch => (
                "Догрузить следующую страницу результатов поиска.",
                object(json!({"requestid": text("Идентификатор поиска")}), &["requestid"]),
            ),
        };
        ToolDefinition::new(self.as_str(), description, parameters)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn int(description: &str) -> Value {
    json!({"type": "integer", "description": description})
}

fn text(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

/// Function definitions for every tool
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

/// Request `tools` array: every function plus web search when a context size is given
#[must_use]
pub fn tool_specs(web_search: Option<&str>) -> Vec<ToolSpec> {
    let mut specs: Vec<ToolSpec> = definitions().into_iter().map(ToolSpec::from).collect();
    if let Some(size) = web_search {
        specs.push(ToolSpec::web_search(size));
    }
    specs
}
