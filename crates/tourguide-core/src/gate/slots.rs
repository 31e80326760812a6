//! Booking slot completeness
//!
//! Four slots must be stated by the customer before a search runs: departure
//! city, travel window, travelers and a quality preference (stars, meal plan,
//! a named hotel, or an explicit "any is fine"). Only the highest-priority
//! missing slot is surfaced, with one canned question.

use super::{has_arg, recent_assistant_text, recent_user_text};
use crate::matcher::{PatternMatcher, PhraseMatcher, TextMatcher};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tourguide_llm::Message;

const MONTHS_GENITIVE: &str =
    "января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря";

const DEPARTURE_PATTERNS: &[&str] = &[
    r"\b(?:москв[аыуе]|мск)\b",
    r"\b(?:петербург\w*|питер\w*|спб|санкт-петербург\w*)\b",
    r"\b(?:екатеринбург\w*|еката)\b",
    r"\b(?:новосибирск\w*)\b",
    r"\b(?:казан[ьи]\w*)\b",
    r"\b(?:краснодар\w*)\b",
    r"\b(?:красноярск\w*)\b",
    r"\b(?:самар\w*)\b",
    r"\b(?:уф[аыуе]\w*)\b",
    r"\b(?:перм[ьи]\w*)\b",
    r"\b(?:челябинск\w*)\b",
    r"\b(?:ростов\w*)\b",
    r"\b(?:минеральн\w+\s*вод|мин\s*вод)\b",
    r"\b(?:тюмен[ьи])\b",
    r"\b(?:нижн\w+\s*новгород|нижний)\b",
    r"\b(?:волгоград)\b",
    r"\b(?:воронеж)\b",
    r"\b(?:омск)\b",
    r"\b(?:иркутск)\b",
    r"\b(?:хабаровск)\b",
    // Sochi is left out: it is far more often the destination
    r"(?:вылет|вылетаем|летим|улетаем)\s+(?:из|с)\s+\w+",
    r"(?:из|с)\s+\w+\s+(?:вылет|вылетаем|улетаем)",
];

const NIGHTS_PATTERNS: &[&str] = &[
    r"\d+\s*(?:ноч|дн|день|дней|ночей)",
    r"(?:на\s+)?(?:неделю|недельку|две недели|2 недели)",
    r"\bнедел[яюи]\b",
    r"(?:на\s+)?(?:выходные|уикенд)",
    r"(?:с\s+)?\d{1,2}(?:\.\d{1,2})?\s*(?:по|-)\s*\d{1,2}",
];

const TRAVELER_PATTERNS: &[&str] = &[
    r"(?:взрослы[хй]|взр\.?|adults)",
    r"(?:дет(?:ей|и|ьми|ям)?|ребен(?:ок|ка)|child)",
    r"(?:я\s+)?\b(?:один|одна|сам[аи]?|одиночк\w*)\b",
    r"(?:двое|два|две)\s+(?:взрослы[хй]|человек|чел\.?)",
    r"(?:трое|три|четыре|пять|шесть)\s+(?:взрослы[хй]|человек|чел\.?)",
    r"\d+\s*(?:взрослы[хй]|человек|чел\.?|взр)",
    r"\d+\s*в\s*\+",
    r"(?:с\s+)?(?:мужем|женой|парнем|девушкой|подругой|другом)",
    r"(?:вдво[её]м|втро[её]м|вчетвером|впятером)",
    r"(?:семь[её]й|компанией|группой)",
    r"(?:мы\s+с\s+)",
];

const STARS_PATTERNS: &[&str] = &[
    r"\d\s*(?:звёзд|звезд|\*|⭐)",
    r"(?:пяти|четырёх|четырех|трёх|трех)звёзд",
];

const MEAL_PATTERNS: &[&str] = &[
    r"(?:всё?\s*включен|all\s*incl|\b(?:аи|уаи)\b|\bai\b|\buai\b)",
    r"(?:полупансион|half\s*board|hb\b)",
    r"(?:полный\s*пансион|full\s*board|fb\b)",
    r"(?:только\s*)?завтрак[аи]?\b",
    r"\b(?:bb|ro|ob)\b",
];

const SKIP_PATTERNS: &[&str] = &[
    r"(?:любой|любую|любое|любые)\s+(?:отель|категори|звёзд|звезд|питани)",
    r"(?:любой|любая|любое)\b",
    r"(?:без\s*разницы|всё\s*равно|все\s*равно)",
    r"(?:не\s*важно|неважно|не\s*принципиально)",
    r"(?:на\s+(?:ваше?|твоё?|твое?)\s+усмотрени)",
    r"(?:рассмотрим\s+вариант|покажите?\s+что\s+есть|какие\s+есть)",
    r"(?:покажите?\s+что-нибудь|что\s+посоветуете)",
];

const BRAND_PATTERNS: &[&str] = &[
    r"\b(?:rixos|hilton|delphin|swissotel|kempinski|calista|titanic|gloria|regnum|maxx\s*royal)\b",
    r"\b(?:iberostar|marriott|sheraton|radisson|accor|hyatt|intercontinental)\b",
    r"(?:в\s+)?отел[ьеи]\s+[а-яА-Яa-zA-Z]{3,}",
];

/// Assistant phrases showing the quality question was already asked
pub const QUALITY_QUESTION_PHRASES: &[&str] = &[
    "категорию отеля",
    "тип питания",
    "звёзд",
    "питание предпочитаете",
    "какой отель",
    "звёздность",
    "всё включено",
];

fn date_patterns() -> Vec<String> {
    vec![
        r"\d{1,2}\.\d{1,2}(?:\.\d{2,4})?".to_string(),
        format!(r"\d{{1,2}}\s+(?:{MONTHS_GENITIVE})"),
        r"\b(?:январ[еья]|феврал[еья]|март[еа]?|апрел[еья]|ма[еяй]|июн[еья]|июл[еья]|август[еа]?|сентябр[еья]|октябр[еья]|ноябр[еья]|декабр[еья])".to_string(),
        format!(r"(?:в\s+)?(?:начале|середине|конце)\s+(?:{MONTHS_GENITIVE}|месяца)"),
        r"(?:на\s+)?(?:майские|новогодние|новый год|8 марта|23 февраля)".to_string(),
        r"(?:завтра|послезавтра|через\s+\w+\s+дн|через\s+неделю|через\s+месяц)".to_string(),
        r"(?:в\s+)?(?:этом|следующем)\s+месяце".to_string(),
        r"(?:в\s+)?ближайшее\s+время".to_string(),
        r"(?:первой|второй)\s+половин[еы]".to_string(),
    ]
}

/// Booking slots in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Departure,
    Window,
    Travelers,
    Quality,
}

/// A missing slot, as reported to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSlot {
    /// No departure city
    Departure,
    /// Neither dates nor duration
    WindowAndDuration,
    /// Duration given, dates not
    WindowMonth,
    /// No traveler composition
    Travelers,
    /// No star rating, meal plan, hotel name or explicit skip
    Quality,
}

impl MissingSlot {
    /// Slot this refers to
    #[must_use]
    pub fn slot(&self) -> Slot {
        match self {
            Self::Departure => Slot::Departure,
            Self::WindowAndDuration | Self::WindowMonth => Slot::Window,
            Self::Travelers => Slot::Travelers,
            Self::Quality => Slot::Quality,
        }
    }

    /// What the customer did not say, in the model's language
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Departure => "город вылета",
            Self::WindowAndDuration => "даты/месяц и длительность",
            Self::WindowMonth => "даты/месяц вылета",
            Self::Travelers => "состав путешественников",
            Self::Quality => "категорию отеля и тип питания (Quality Check)",
        }
    }

    /// The single clarifying question to ask
    #[must_use]
    pub fn question(&self) -> &'static str {
        match self {
            Self::Departure => "Из какого города планируете вылет?",
            Self::WindowAndDuration => "Когда планируете поездку и на сколько ночей?",
            Self::WindowMonth => "В каком месяце планируете вылет?",
            Self::Travelers => "Сколько взрослых едет и будут ли с вами дети?",
            Self::Quality => "Какую категорию отеля и тип питания предпочитаете?",
        }
    }

    /// In-band tool error instructing the model to ask this one question
    #[must_use]
    pub fn block_payload(&self) -> Value {
        json!({
            "status": "error",
            "error": format!(
                "СИСТЕМНАЯ ОШИБКА ВАЛИДАЦИИ КАСКАДА: Клиент НЕ указал {}! \
                 ОБЯЗАТЕЛЬНО спроси клиента ЯВНО: '{}'. \
                 Задай ТОЛЬКО ОДИН вопрос, не перечисляй список! \
                 НЕ вызывай search_tours пока клиент не ответит!",
                self.label(),
                self.question()
            ),
            "_hint": "Это защита от пропуска слотов каскада. Спроси ОДИН вопрос о недостающих данных.",
        })
    }
}

impl fmt::Display for MissingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStatus {
    pub departure: bool,
    pub window: bool,
    pub travelers: bool,
    pub quality: bool,
    /// Missing slots in priority order
    pub missing: Vec<MissingSlot>,
}

impl SlotStatus {
    /// Every slot satisfied
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// The slot to ask about next
    #[must_use]
    pub fn first_missing(&self) -> Option<MissingSlot> {
        self.missing.first().copied()
    }
}

/// Slot gate with swappable matcher sets
#[derive(Debug, Clone)]
pub struct SlotGate {
    departure: Arc<dyn TextMatcher>,
    dates: Arc<dyn TextMatcher>,
    nights: Arc<dyn TextMatcher>,
    travelers: Arc<dyn TextMatcher>,
    stars: Arc<dyn TextMatcher>,
    meal: Arc<dyn TextMatcher>,
    brand: Arc<dyn TextMatcher>,
    skip: Arc<dyn TextMatcher>,
    quality_asked: Arc<dyn TextMatcher>,
}

impl Default for SlotGate {
    fn default() -> Self {
        let dates = date_patterns();
        let dates: Vec<&str> = dates.iter().map(String::as_str).collect();
        Self {
            departure: Arc::new(PatternMatcher::builtin(DEPARTURE_PATTERNS)),
            dates: Arc::new(PatternMatcher::builtin(&dates)),
            nights: Arc::new(PatternMatcher::builtin(NIGHTS_PATTERNS)),
            travelers: Arc::new(PatternMatcher::builtin(TRAVELER_PATTERNS)),
            stars: Arc::new(PatternMatcher::builtin(STARS_PATTERNS)),
            meal: Arc::new(PatternMatcher::builtin(MEAL_PATTERNS)),
            brand: Arc::new(PatternMatcher::builtin(BRAND_PATTERNS)),
            skip: Arc::new(PatternMatcher::builtin(SKIP_PATTERNS)),
            quality_asked: Arc::new(PhraseMatcher::new(QUALITY_QUESTION_PHRASES)),
        }
    }
}

impl SlotGate {
    /// Gate with the built-in pattern tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the departure matcher
    #[must_use]
    pub fn with_departure_matcher(mut self, matcher: Arc<dyn TextMatcher>) -> Self {
        self.departure = matcher;
        self
    }

    /// Replace the quality-skip matcher (applied to the last user message only)
    #[must_use]
    pub fn with_skip_matcher(mut self, matcher: Arc<dyn TextMatcher>) -> Self {
        self.skip = matcher;
        self
    }

    /// Evaluate the replay log against proposed search arguments.
    ///
    /// A `hotels` argument satisfies the quality slot: the category then comes
    /// from the hotel itself.
    #[must_use]
    pub fn evaluate(&self, history: &[Message], args: &Map<String, Value>) -> SlotStatus {
        let (user_text, last_user) = recent_user_text(history);
        let mut missing = Vec::new();

        let departure = self.departure.matches(&user_text);
        if !departure {
            missing.push(MissingSlot::Departure);
        }

        let has_date = self.dates.matches(&user_text);
        let has_nights = self.nights.matches(&user_text);
        if !has_date {
            missing.push(if has_nights {
                MissingSlot::WindowMonth
            } else {
                MissingSlot::WindowAndDuration
            });
        }

        let travelers = self.travelers.matches(&user_text);
        if !travelers {
            missing.push(MissingSlot::Travelers);
        }

        let stated = self.stars.matches(&user_text)
            || self.meal.matches(&user_text)
            || self.brand.matches(&user_text)
            || self.skip.matches(&last_user)
            || has_arg(args, "hotels");
        // A reply to an explicit quality question counts as an implicit skip
        let quality = stated || self.quality_asked.matches(&recent_assistant_text(history));
        if !quality {
            missing.push(MissingSlot::Quality);
        }

        SlotStatus {
            departure,
            window: has_date,
            travelers,
            quality,
            missing,
        }
    }
}
