//! Named resort without a region filter
//!
//! When the customer names a resort but the search carries no region,
//! subregion or hotel filter, the search would cover the whole country.

use super::{has_arg, recent_user_text};
use crate::matcher::PatternMatcher;
use serde_json::{json, Map, Value};
use tourguide_llm::Message;

/// Resort pattern and the genitive country name used in the hint
const RESORTS: &[(&str, &str)] = &[
    (r"\b(?:кисловодск|пятигорск|ессентуки|железноводск|минеральн\w*\s*вод)\b", "России"),
    (r"\b(?:сочи|адлер|красн\w*\s*полян)\b", "России"),
    (r"\b(?:анап[аыуе]|геленджик|новоросс)\b", "России"),
    (r"\b(?:крым|ялт[аыуе]|алушт[аыуе]|севастопол|феодоси|судак|евпатори)\b", "России"),
    (r"\b(?:калининград|светлогорск|зеленоградск)\b", "России"),
    (r"\b(?:пхукет|пукет)\b", "Таиланда"),
    (r"\b(?:паттай[яеу]|паттая)\b", "Таиланда"),
    (r"\b(?:самуи)\b", "Таиланда"),
    (r"\b(?:краби)\b", "Таиланда"),
    (r"\b(?:хуа\s*хин)\b", "Таиланда"),
    (r"\b(?:алан[ьи]я|аланья)\b", "Турции"),
    (r"\b(?:анталь?я|анталия)\b", "Турции"),
    (r"\b(?:кемер)\b", "Турции"),
    (r"\b(?:сиде)\b", "Турции"),
    (r"\b(?:белек)\b", "Турции"),
    (r"\b(?:бодрум)\b", "Турции"),
    (r"\b(?:мармарис)\b", "Турции"),
    (r"\b(?:фетхие|фетие)\b", "Турции"),
    (r"\b(?:кушадас)\b", "Турции"),
    (r"\b(?:стамбул)\b", "Турции"),
    (r"\b(?:шарм|шарм-эль-шейх|шарм\s*эль\s*шейх)\b", "Египта"),
    (r"\b(?:хургад[аыуе])\b", "Египта"),
    (r"\b(?:марса\s*алам)\b", "Египта"),
    (r"\b(?:дахаб)\b", "Египта"),
    (r"\b(?:дубай|дубаи)\b", "ОАЭ"),
    (r"\b(?:абу[\s-]*даби)\b", "ОАЭ"),
    (r"\b(?:шардж[аеу])\b", "ОАЭ"),
    (r"\b(?:рас[\s-]*аль[\s-]*хайм)\b", "ОАЭ"),
    (r"\b(?:фукуок|фу\s*куок)\b", "Вьетнама"),
    (r"\b(?:нячанг|ня\s*чанг)\b", "Вьетнама"),
    (r"\b(?:фантьет|фан\s*тьет|муйне|муй\s*не)\b", "Вьетнама"),
    (r"\b(?:коломбо|бентот[аы]|хиккадув[аы]|унаватун[аы])\b", "Шри-Ланки"),
    (r"\b(?:мале|маафуш)\b", "Мальдив"),
    (r"\b(?:варадеро|гаван[аы])\b", "Кубы"),
    (r"\b(?:пунта[\s-]*кан[аы]|бока[\s-]*чик[аы])\b", "Доминиканы"),
];

/// Arguments any of which scopes a search below country level
const SCOPING_ARGS: &[&str] = &["regions", "subregions", "hotels"];

/// A resort the customer named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResortMention {
    /// Matched text, lowercased
    pub resort: String,
    /// Country name in the genitive
    pub country: &'static str,
}

impl ResortMention {
    /// In-band tool error telling the model to resolve the region code first
    #[must_use]
    pub fn error_payload(&self, country_code: &str) -> Value {
        let resort = &self.resort;
        json!({
            "status": "error",
            "error": format!(
                "СИСТЕМНАЯ ОШИБКА: Клиент указал конкретный курорт '{resort}', \
                 но ты НЕ передал параметр regions в search_tours! \
                 ОБЯЗАТЕЛЬНО определи код региона: вызови get_dictionaries(type='region', regcountry={country_code}) \
                 и найди код для '{resort}'. Затем передай regions=КОД в search_tours. \
                 Без regions поиск вернёт туры по ВСЕЙ стране, а не по указанному курорту!"
            ),
            "_hint": format!("Определи код региона '{resort}' через get_dictionaries и передай в regions."),
        })
    }
}

/// Resort→country table
#[derive(Debug, Clone)]
pub struct ResortTable {
    matcher: PatternMatcher,
    countries: Vec<&'static str>,
}

impl Default for ResortTable {
    fn default() -> Self {
        let patterns: Vec<&str> = RESORTS.iter().map(|(pattern, _)| *pattern).collect();
        Self {
            matcher: PatternMatcher::builtin(&patterns),
            countries: RESORTS.iter().map(|(_, country)| *country).collect(),
        }
    }
}

impl ResortTable {
    /// Table with the built-in resorts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First resort named in the text; table order decides ties
    #[must_use]
    pub fn find(&self, text: &str) -> Option<ResortMention> {
        let (index, resort) = self.matcher.first_match(text)?;
        Some(ResortMention {
            resort: resort.to_string(),
            country: self.countries.get(index).copied()?,
        })
    }

    /// Resort the customer named while the search has no region-level filter
    #[must_use]
    pub fn unscoped_mention(
        &self,
        history: &[Message],
        args: &Map<String, Value>,
    ) -> Option<ResortMention> {
        if SCOPING_ARGS.iter().any(|key| has_arg(args, key)) {
            return None;
        }
        let (user_text, _) = recent_user_text(history);
        self.find(&user_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_resort() {
        let table = ResortTable::new();
        let mention = table.find("хотим в кемер на неделю").unwrap();
        assert_eq!(mention.resort, "кемер");
        assert_eq!(mention.country, "Турции");

        let mention = table.find("летим на пхукет").unwrap();
        assert_eq!(mention.country, "Таиланда");
        assert!(table.find("хотим в турцию").is_none());
    }

    #[test]
    fn test_scoping_args_suppress_check() {
        let table = ResortTable::new();
        let history = vec![Message::user("Хотим в Хургаду")];
        let mut args = Map::new();
        args.insert("country".into(), Value::from(1));
        let mention = table.unscoped_mention(&history, &args).unwrap();
        assert_eq!(mention.resort, "хургаду");
        assert_eq!(mention.country, "Египта");

        args.insert("regions".into(), Value::from("5"));
        assert!(table.unscoped_mention(&history, &args).is_none());

        let mut empty_region = Map::new();
        empty_region.insert("regions".into(), Value::from(""));
        assert!(table.unscoped_mention(&history, &empty_region).is_some());
    }

    #[test]
    fn test_error_payload() {
        let mention = ResortMention {
            resort: "сочи".into(),
            country: "России",
        };
        let payload = mention.error_payload("47");
        let error = payload["error"].as_str().unwrap();
        assert!(error.contains("конкретный курорт 'сочи'"));
        assert!(error.contains("regcountry=47"));
        assert_eq!(
            payload["_hint"],
            "Определи код региона 'сочи' через get_dictionaries и передай в regions."
        );
    }
}
