//! Tool dispatcher
//!
//! Maps each model tool call onto the search backend. Every outcome, including
//! validation blocks and backend failures, comes back as a JSON tool output so
//! the model can react in-band; nothing here fails the turn.

use crate::gate::{ResortTable, SlotGate};
use crate::metrics::OrchestratorMetrics;
use chrono::{Datelike, Local, NaiveDate};
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tourguide_llm::{InputItem, Message, ToolCall};
use tourguide_tools::cards::{
    departure_city_name, hotel_count, hotel_profile, summarize_hotels, DEFAULT_DEPARTURE_CITY,
    MAX_HOT_TOURS, MAX_RESULT_HOTELS,
};
use tourguide_tools::coerce::{safe_int, safe_str};
use tourguide_tools::query::wire_param;
use tourguide_tools::{
    normalize_nights, normalize_search_window, poll_until_ready, Dictionary, Error as ToolError,
    HotToursQuery, HotTourSummary, PollConfig, PollOutcome, ResultsQuery, SearchQuery, ToolName,
    TourCard, TourSearchBackend,
};
use tracing::{debug, error, info, instrument, warn};

type ToolResult<T> = tourguide_tools::Result<T>;

/// Hotels returned by a name-filtered catalog lookup
const MAX_CATALOG_HOTELS: usize = 20;

/// Arguments whose absence is logged before a search is submitted
const LOGGED_SEARCH_ARGS: &[&str] = &["adults", "datefrom", "dateto", "stars", "meal"];

const WEEKDAYS: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];

const CARDS_SHOWN_HINT: &str = "Карточки с фото, ценами, датами, питанием, звёздами УЖЕ отображены фронтендом. \
     НЕ перечисляй отели, цены, описания, даты, питание, звёзды в тексте! \
     Напиши ТОЛЬКО краткий комментарий (1-2 предложения) и спроси клиента.";

const HOT_CARDS_SHOWN_HINT: &str = "Карточки с фото, ценами, датами, питанием, звёздами УЖЕ отображены фронтендом. \
     НЕ перечисляй отели, цены, описания, звёзды в тексте! \
     Напиши ТОЛЬКО краткий комментарий и упомяни что цены за человека.";

/// Result of one tool call, ready to be sent back to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Correlation id of the call
    pub call_id: String,
    /// Tool name as requested
    pub name: String,
    /// JSON-encoded payload
    pub output: String,
}

impl ToolOutput {
    /// Function output item for the next model call
    #[must_use]
    pub fn to_input_item(&self) -> InputItem {
        InputItem::function_output(self.call_id.as_str(), self.output.as_str())
    }
}

/// Executes tool calls against a backend and collects presentation cards
pub struct ToolDispatcher {
    backend: Arc<dyn TourSearchBackend>,
    gate: SlotGate,
    resorts: ResortTable,
    poll: PollConfig,
    metrics: OrchestratorMetrics,
    pending_cards: Vec<TourCard>,
    departure_city: String,
    today: Option<NaiveDate>,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("poll", &self.poll)
            .field("pending_cards", &self.pending_cards.len())
            .field("departure_city", &self.departure_city)
            .finish()
    }
}

impl ToolDispatcher {
    /// Create a dispatcher sharing the given metrics
    pub fn new(backend: Arc<dyn TourSearchBackend>, metrics: OrchestratorMetrics) -> Self {
        Self {
            backend,
            gate: SlotGate::default(),
            resorts: ResortTable::default(),
            poll: PollConfig::default(),
            metrics,
            pending_cards: Vec::new(),
            departure_city: DEFAULT_DEPARTURE_CITY.to_string(),
            today: None,
        }
    }

    /// Replace the slot gate
    #[must_use]
    pub fn with_gate(mut self, gate: SlotGate) -> Self {
        self.gate = gate;
        self
    }

    /// Replace the resort table
    #[must_use]
    pub fn with_resorts(mut self, resorts: ResortTable) -> Self {
        self.resorts = resorts;
        self
    }

    /// Set the status polling budget
    #[must_use]
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Pin the current date (date repair and `get_current_date`)
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Departure city used for result cards
    #[must_use]
    pub fn departure_city(&self) -> &str {
        &self.departure_city
    }

    /// Cards collected so far in this turn
    #[must_use]
    pub fn pending_cards(&self) -> &[TourCard] {
        &self.pending_cards
    }

    /// Hand the collected cards to the caller
    pub fn take_pending_cards(&mut self) -> Vec<TourCard> {
        std::mem::take(&mut self.pending_cards)
    }

    /// Drop cards left from a previous turn
    pub fn clear_pending_cards(&mut self) {
        self.pending_cards.clear();
    }

    /// Forget per-conversation state
    pub fn reset(&mut self) {
        self.pending_cards.clear();
        self.departure_city = DEFAULT_DEPARTURE_CITY.to_string();
    }

    /// Execute one call. Failures are rendered into the output, never returned.
    #[instrument(skip(self, call, history), fields(tool = %call.name, call_id = %call.call_id))]
    pub async fn execute(&mut self, call: &ToolCall, history: &[Message]) -> ToolOutput {
        let start = Instant::now();
        let payload = match ToolName::from_str(&call.name) {
            Err(_) => {
                warn!(tool = %call.name, "Unknown tool requested");
                json!({ "error": format!("Неизвестная функция: {}", call.name) })
            }
            Ok(tool) => match call.parse_arguments() {
                Err(e) => {
                    error!(error = %e, "Tool arguments are not valid JSON");
                    json!({ "error": format!("Неожиданная ошибка: {e}") })
                }
                Ok(args) => match self.dispatch(tool, args, history).await {
                    Ok(value) => value,
                    Err(e) if e.is_business() => {
                        warn!(error = %e, "Tool returned a business error");
                        json!({ "error": format!("Ошибка: {e}") })
                    }
                    Err(e) => {
                        error!(error = %e, "Tool failed");
                        json!({ "error": format!("Неожиданная ошибка: {e}") })
                    }
                },
            },
        };

        let output = payload.to_string();
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            result_size = output.len(),
            "Tool call finished"
        );
        ToolOutput {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            output,
        }
    }

    async fn dispatch(
        &mut self,
        tool: ToolName,
        args: Map<String, Value>,
        history: &[Message],
    ) -> ToolResult<Value> {
        match tool {
            ToolName::GetCurrentDate => Ok(self.current_date()),
            ToolName::SearchTours => self.search_tours(args, history).await,
            ToolName::GetSearchStatus => self.search_status(&args).await,
            ToolName::GetSearchResults => self.search_results(&args).await,
            ToolName::GetDictionaries => self.dictionaries(&args).await,
            ToolName::ActualizeTour => {
                let tour_id = required_str(&args, "tourid")?;
                self.backend
                    .actualize_tour(
                        &tour_id,
                        safe_int(args.get("request"), 2),
                        safe_int(args.get("currency"), 0),
                    )
                    .await
            }
            ToolName::GetTourDetails => {
                let tour_id = required_str(&args, "tourid")?;
                self.backend
                    .tour_details(&tour_id, safe_int(args.get("currency"), 0))
                    .await
            }
            ToolName::GetHotelInfo => {
                let hotel_code = required_str(&args, "hotelcode")?;
                let include_reviews = safe_int(args.get("reviews"), 0) == 1;
                let hotel = self.backend.hotel_info(&hotel_code, include_reviews).await?;
                Ok(hotel_profile(&hotel, include_reviews))
            }
            ToolName::GetHotTours => self.hot_tours(&args).await,
            ToolName::ContinueSearch => {
                let request_id = required_str(&args, "requestid")?;
                let result = self.backend.continue_search(&request_id).await?;
                let page = safe_str(result.get("page")).unwrap_or_else(|| "2".to_string());
                Ok(json!({
                    "page": page,
                    "message": format!(
                        "Продолжение поиска запущено (страница {page}). \
                         Вызови get_search_status для ожидания завершения, затем get_search_results."
                    ),
                }))
            }
        }
    }

    fn current_date(&self) -> Value {
        let now = Local::now();
        let date = self.today.unwrap_or_else(|| now.date_naive());
        let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
        json!({
            "date": date.format("%d.%m.%Y").to_string(),
            "time": now.format("%H:%M").to_string(),
            "year": date.year(),
            "month": date.month(),
            "day": date.day(),
            "weekday": weekday,
            "hint": "Используй эту дату для datefrom/dateto. Формат: ДД.ММ.ГГГГ",
        })
    }

    async fn search_tours(
        &mut self,
        mut args: Map<String, Value>,
        history: &[Message],
    ) -> ToolResult<Value> {
        if let Some(code) = args.get("departure").filter(|v| !v.is_null()) {
            if let Some(city) = departure_city_name(safe_int(Some(code), 0)) {
                self.departure_city = city.to_string();
            }
        }

        match normalize_search_window(&mut args, self.today()) {
            Ok(corrections) => {
                for correction in &corrections {
                    warn!(?correction, "Departure window corrected");
                    self.metrics.date_window_corrections.inc();
                }
            }
            Err(e) => warn!(error = %e, "Departure window left as given"),
        }

        if let Some(mention) = self.resorts.unscoped_mention(history, &args) {
            self.metrics.resort_without_region_detections.inc();
            let country = args.get("country").and_then(wire_param).unwrap_or_default();
            warn!(
                resort = %mention.resort,
                country = %country,
                "Resort named but no region filter, search blocked"
            );
            return Ok(mention.error_payload(&country));
        }

        let slots = self.gate.evaluate(history, &args);
        if let Some(missing) = slots.first_missing() {
            self.metrics.cascade_incomplete_detections.inc();
            warn!(
                missing = %missing,
                departure = slots.departure,
                window = slots.window,
                travelers = slots.travelers,
                quality = slots.quality,
                "Booking slots incomplete, search blocked"
            );
            return Ok(missing.block_payload());
        }

        for correction in normalize_nights(&mut args) {
            warn!(?correction, "Night range corrected");
            self.metrics.night_corrections.inc();
        }

        let absent: Vec<&str> = LOGGED_SEARCH_ARGS
            .iter()
            .copied()
            .filter(|key| !args.contains_key(*key))
            .collect();
        if !absent.is_empty() {
            info!(?absent, "Search submitted without some parameters");
        }

        self.metrics.total_searches.inc();
        let query = SearchQuery::from_args(&args);
        match self.backend.search_tours(&query).await? {
            Some(request_id) => {
                info!(request_id = %request_id, "Search submitted");
                Ok(json!({
                    "requestid": request_id,
                    "message": "Поиск запущен. Вызови get_search_status — он автоматически дождётся результатов. Затем get_search_results.",
                }))
            }
            None => Ok(json!({
                "error": "Не удалось создать поиск. Проверьте даты — они должны быть в будущем (2026 год или позже).",
                "hint": "Используйте формат ДД.ММ.ГГГГ, например 01.03.2026",
            })),
        }
    }

    async fn search_status(&self, args: &Map<String, Value>) -> ToolResult<Value> {
        let request_id = required_str(args, "requestid")?;
        let backend = Arc::clone(&self.backend);
        let outcome = poll_until_ready(&self.poll, || {
            let backend = Arc::clone(&backend);
            let request_id = request_id.clone();
            async move { backend.search_status(&request_id).await }
        })
        .await?;

        let max_wait = self.poll.max_wait.as_secs();
        let status = match outcome {
            PollOutcome::Finished(status) => {
                let (hotels, tours) = (status.hotels_found, status.tours_found);
                if hotels == 0 || tours == 0 {
                    return Err(ToolError::NoResults {
                        message: format!("Поиск завершён: найдено {hotels} отелей, {tours} туров"),
                        hint: "Попробуйте расширить даты, увеличить бюджет или убрать фильтры"
                            .to_string(),
                    });
                }
                status.with_hint(format!(
                    "Поиск завершён! Найдено {hotels} отелей, {tours} туров. \
                     Вызови get_search_results с requestid для получения списка отелей."
                ))
            }
            PollOutcome::NotFound(status) => {
                warn!(request_id = %request_id, "Search id unknown upstream");
                status.with_hint("Поиск не найден. requestid недействителен — нужен новый поиск.")
            }
            PollOutcome::Partial(status) => {
                let (progress, hotels) = (status.progress, status.hotels_found);
                status.with_hint(format!(
                    "Поиск ещё идёт ({progress}%), но уже найдено {hotels} отелей. \
                     Вызови get_search_results с этим requestid для показа результатов."
                ))
            }
            PollOutcome::TimedOut(status) if status.hotels_found > 0 => {
                let hotels = status.hotels_found;
                warn!(request_id = %request_id, hotels, "Search polling timed out with partial results");
                status.with_hint(format!(
                    "Поиск не завершился за {max_wait}с, но найдено {hotels} отелей. \
                     Вызови get_search_results для показа частичных результатов."
                ))
            }
            PollOutcome::TimedOut(status) => {
                warn!(request_id = %request_id, "Search polling timed out without results");
                status.with_hint(format!(
                    "Поиск не завершился за {max_wait}с и результатов нет. \
                     Предложи клиенту изменить параметры (даты, бюджет, направление)."
                ))
            }
        };
        serde_json::to_value(status).map_err(|e| ToolError::Parse(e.to_string()))
    }

    async fn search_results(&mut self, args: &Map<String, Value>) -> ToolResult<Value> {
        let query = ResultsQuery::from_args(args)?;
        let payload = self.backend.search_results(&query).await?;
        let hotels = summarize_hotels(&payload, MAX_RESULT_HOTELS);

        self.pending_cards = hotels
            .iter()
            .map(|hotel| hotel.to_card(&self.departure_city))
            .collect();
        info!(cards = self.pending_cards.len(), "Built tour cards");

        let hotels_found = payload
            .pointer("/status/hotelsfound")
            .map(|v| safe_int(Some(v), 0))
            .unwrap_or(hotel_count(&payload) as i64);
        let tours_found = safe_int(payload.pointer("/status/toursfound"), 0);
        let views: Vec<Value> = hotels.iter().map(|hotel| hotel.model_view()).collect();
        Ok(json!({
            "hotels_found": hotels_found,
            "tours_found": tours_found,
            "hotels": views,
            "_hint": CARDS_SHOWN_HINT,
        }))
    }

    async fn hot_tours(&mut self, args: &Map<String, Value>) -> ToolResult<Value> {
        let query = HotToursQuery::from_args(args)?;
        let tours = self.backend.hot_tours(&query).await?;
        let summaries: Vec<HotTourSummary> = tours
            .iter()
            .take(MAX_HOT_TOURS)
            .map(HotTourSummary::from_value)
            .collect();

        self.pending_cards = summaries.iter().map(HotTourSummary::to_card).collect();
        info!(cards = self.pending_cards.len(), "Built hot tour cards");

        let views: Vec<Value> = summaries.iter().map(HotTourSummary::model_view).collect();
        Ok(json!({
            "total_found": tours.len(),
            "note": "ВАЖНО: Цены указаны ЗА ЧЕЛОВЕКА! Для двоих умножай на 2.",
            "tours": views,
            "_hint": HOT_CARDS_SHOWN_HINT,
        }))
    }

    async fn dictionaries(&self, args: &Map<String, Value>) -> ToolResult<Value> {
        let Some(dictionary) = Dictionary::from_args(args) else {
            let kind = args.get("type").and_then(Value::as_str).unwrap_or_default();
            return Ok(json!({ "error": format!("Неизвестный тип справочника: {kind}") }));
        };
        debug!(list = dictionary.list_type(), "Reference lookup");
        match &dictionary {
            Dictionary::Hotels(filter) => {
                let hotels: Vec<Value> = self
                    .backend
                    .hotels(filter)
                    .await?
                    .into_iter()
                    .filter(|hotel| filter.matches_name(hotel))
                    .take(MAX_CATALOG_HOTELS)
                    .collect();
                Ok(Value::Array(hotels))
            }
            _ => self.backend.dictionary(&dictionary).await,
        }
    }
}

fn required_str(args: &Map<String, Value>, key: &str) -> ToolResult<String> {
    safe_str(args.get(key)).ok_or_else(|| ToolError::InvalidInput(format!("{key} is required")))
}
