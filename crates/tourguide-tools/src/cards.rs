//! Result projections: compact model summaries and presentation cards
//!
//! Backend results are projected twice. The model receives names and warning
//! flags only; everything a customer looks at (price, dates, photo, meal) goes
//! into a [`TourCard`] that is rendered directly and never re-enters the context.

use crate::coerce::{as_list, end_date_iso, flag, safe_float, safe_int, safe_str, wire_to_iso};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Photos forwarded from a hotel record
pub const MAX_HOTEL_IMAGES: usize = 5;

/// Reviews forwarded from a hotel record
pub const MAX_REVIEWS: usize = 3;

/// Review text is cut to this many characters
const REVIEW_EXCERPT_CHARS: usize = 300;

/// Hotels forwarded from a search result page
pub const MAX_RESULT_HOTELS: usize = 5;

/// Hot-deal tours forwarded from one hot tours query
pub const MAX_HOT_TOURS: usize = 7;

/// Fallback departure city
pub const DEFAULT_DEPARTURE_CITY: &str = "Москва";

/// TourVisor departure city codes
const DEPARTURE_CITIES: &[(i64, &str)] = &[
    (1, "Москва"),
    (2, "Пермь"),
    (3, "Екатеринбург"),
    (4, "Уфа"),
    (5, "Санкт-Петербург"),
    (6, "Челябинск"),
    (7, "Самара"),
    (9, "Новосибирск"),
    (10, "Казань"),
    (11, "Краснодар"),
    (12, "Красноярск"),
    (18, "Ростов-на-Дону"),
    (56, "Сочи"),
];

/// Meal plan codes used by hot tours
const MEAL_CODES: &[(&str, &str)] = &[
    ("RO", "Без питания"),
    ("BB", "Только завтрак"),
    ("HB", "Завтрак и ужин"),
    ("HB+", "Полупансион+"),
    ("FB", "Полный пансион"),
    ("FB+", "Полный пансион+"),
    ("AI", "Всё включено"),
    ("UAI", "Ультра всё включено"),
];

/// Name of a departure city code
#[must_use]
pub fn departure_city_name(code: i64) -> Option<&'static str> {
    DEPARTURE_CITIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Russian description of a meal code; unknown codes pass through
#[must_use]
pub fn meal_description(code: &str) -> String {
    let code = code.trim();
    MEAL_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(|| code.to_string(), |(_, ru)| (*ru).to_string())
}

/// Presentation-ready summary of one offer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourCard {
    pub hotel_name: String,
    pub hotel_stars: i64,
    pub hotel_rating: Option<f64>,
    pub country: String,
    pub resort: String,
    pub region: String,
    /// ISO departure date
    pub date_from: Option<String>,
    /// ISO return date
    pub date_to: Option<String>,
    pub nights: i64,
    /// Total price (per person for hot deals)
    pub price: i64,
    /// Set only for hot deals, which are priced per person
    pub price_per_person: Option<i64>,
    /// Meal code, when known
    pub food_type: String,
    pub meal_description: String,
    pub room_type: String,
    pub image_url: Option<String>,
    pub hotel_link: String,
    /// Tour id
    pub id: String,
    pub departure_city: String,
    pub is_hotel_only: bool,
    pub flight_included: bool,
    pub operator: String,
}

/// Best offer of a result hotel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferSummary {
    pub tourid: Option<String>,
    pub price: i64,
    pub flydate: String,
    pub nights: i64,
    /// Russian meal description
    pub meal: String,
    pub room: String,
    pub operatorname: String,
    pub nightflight: bool,
    pub noflight: bool,
    pub notransfer: bool,
    pub nomedinsurance: bool,
    pub nomeal: bool,
    pub onrequest: bool,
}

impl OfferSummary {
    fn from_value(tour: &Value) -> Self {
        let text = |key: &str| safe_str(tour.get(key)).unwrap_or_default();
        Self {
            tourid: safe_str(tour.get("tourid")),
            price: safe_int(tour.get("price"), 0),
            flydate: text("flydate"),
            nights: safe_int(tour.get("nights"), 7),
            meal: text("mealrussian"),
            room: text("room"),
            operatorname: text("operatorname"),
            nightflight: flag(tour.get("nightflight")),
            noflight: flag(tour.get("noflight")),
            notransfer: flag(tour.get("notransfer")),
            nomedinsurance: flag(tour.get("nomedinsurance")),
            nomeal: flag(tour.get("nomeal")),
            onrequest: flag(tour.get("onrequest")),
        }
    }

    /// Customer-relevant exclusions and caveats
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        [
            (self.nightflight, "ночной перелёт"),
            (self.noflight, "без перелёта"),
            (self.notransfer, "без трансфера"),
            (self.nomedinsurance, "без мед.страховки"),
            (self.nomeal, "без питания"),
            (self.onrequest, "под запрос"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}

/// One hotel of a search result page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelSummary {
    pub hotelcode: Option<String>,
    pub hotelname: String,
    pub hotelstars: i64,
    pub hotelrating: Option<f64>,
    pub regionname: String,
    pub countryname: String,
    pub price: i64,
    /// Real photo only; region placeholders are dropped
    pub picturelink: Option<String>,
    pub fulldesclink: Option<String>,
    pub offer: Option<OfferSummary>,
}

/// A photo is real when flagged as such and not a `/reg-` region placeholder
fn real_picture(link: Option<&Value>, is_photo: bool) -> Option<String> {
    safe_str(link).filter(|url| is_photo && !url.contains("/reg-"))
}

impl HotelSummary {
    /// Project one raw `hotel` element
    #[must_use]
    pub fn from_value(hotel: &Value) -> Self {
        let text = |key: &str| safe_str(hotel.get(key)).unwrap_or_default();
        let offer = hotel
            .pointer("/tours/tour")
            .and_then(|tours| match tours {
                Value::Array(list) => list.first(),
                single @ Value::Object(_) => Some(single),
                _ => None,
            })
            .map(OfferSummary::from_value);
        Self {
            hotelcode: safe_str(hotel.get("hotelcode")),
            hotelname: text("hotelname"),
            hotelstars: safe_int(hotel.get("hotelstars"), 0),
            hotelrating: safe_float(hotel.get("hotelrating")),
            regionname: text("regionname"),
            countryname: text("countryname"),
            price: safe_int(hotel.get("price"), 0),
            picturelink: real_picture(
                hotel.get("picturelink"),
                safe_int(hotel.get("isphoto"), 0) == 1,
            ),
            fulldesclink: safe_str(hotel.get("fulldesclink")),
            offer,
        }
    }

    /// What the model sees: code, name and warnings (omitted when empty)
    #[must_use]
    pub fn model_view(&self) -> Value {
        let mut entry = json!({
            "hotelcode": self.hotelcode,
            "hotelname": self.hotelname,
        });
        let warnings = self.offer.as_ref().map(OfferSummary::warnings).unwrap_or_default();
        if !warnings.is_empty() {
            entry["warnings"] = json!(warnings);
        }
        entry
    }

    /// Presentation card for this hotel's best offer
    #[must_use]
    pub fn to_card(&self, departure_city: &str) -> TourCard {
        let offer = self.offer.clone().unwrap_or_else(|| OfferSummary {
            nights: 7,
            ..OfferSummary::default()
        });
        let price = if offer.price != 0 { offer.price } else { self.price };
        TourCard {
            hotel_name: non_empty_or(&self.hotelname, "Отель"),
            hotel_stars: self.hotelstars,
            hotel_rating: self.hotelrating,
            country: self.countryname.clone(),
            resort: self.regionname.clone(),
            region: self.regionname.clone(),
            date_from: wire_to_iso(&offer.flydate),
            date_to: end_date_iso(&offer.flydate, offer.nights),
            nights: offer.nights,
            price,
            price_per_person: None,
            food_type: String::new(),
            meal_description: offer.meal.clone(),
            room_type: non_empty_or(&offer.room, "Standard"),
            image_url: self.picturelink.clone(),
            hotel_link: self.fulldesclink.clone().unwrap_or_else(|| "#".to_string()),
            id: offer.tourid.clone().unwrap_or_default(),
            departure_city: departure_city.to_string(),
            is_hotel_only: offer.noflight,
            flight_included: !offer.noflight,
            operator: offer.operatorname,
        }
    }
}

/// One hot-deal tour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotTourSummary {
    pub hotelcode: Option<String>,
    pub hotelname: String,
    pub hotelstars: i64,
    pub hotelrating: Option<f64>,
    pub countryname: String,
    pub regionname: String,
    pub departurename: String,
    pub operatorname: String,
    pub price_per_person: i64,
    pub price_old: i64,
    pub discount_percent: i64,
    pub currency: String,
    pub flydate: String,
    pub nights: i64,
    /// Meal code (`AI`, `BB`, ...)
    pub meal: String,
    pub tourid: Option<String>,
    pub picturelink: Option<String>,
    pub fulldesclink: Option<String>,
}

impl HotTourSummary {
    /// Project one raw hot tour
    #[must_use]
    pub fn from_value(tour: &Value) -> Self {
        let text = |key: &str| safe_str(tour.get(key)).unwrap_or_default();
        let price = safe_int(tour.get("price"), 0);
        let price_old = safe_int(tour.get("priceold"), 0);
        let discount_percent = if price_old > 0 {
            ((price_old - price) as f64 / price_old as f64 * 100.0).round() as i64
        } else {
            0
        };
        Self {
            hotelcode: safe_str(tour.get("hotelcode")),
            hotelname: text("hotelname"),
            hotelstars: safe_int(tour.get("hotelstars"), 0),
            hotelrating: safe_float(tour.get("hotelrating")),
            countryname: text("countryname"),
            regionname: text("hotelregionname"),
            departurename: text("departurename"),
            operatorname: text("operatorname"),
            price_per_person: price,
            price_old,
            discount_percent,
            currency: non_empty_or(&text("currency"), "RUB"),
            flydate: text("flydate"),
            nights: safe_int(tour.get("nights"), 7),
            meal: text("meal"),
            tourid: safe_str(tour.get("tourid")),
            picturelink: real_picture(tour.get("hotelpicture"), true),
            fulldesclink: safe_str(tour.get("fulldesclink")),
        }
    }

    /// What the model sees
    #[must_use]
    pub fn model_view(&self) -> Value {
        json!({
            "hotelcode": self.hotelcode,
            "hotelname": self.hotelname,
        })
    }

    /// Presentation card; hot deal prices are per person
    #[must_use]
    pub fn to_card(&self) -> TourCard {
        TourCard {
            hotel_name: non_empty_or(&self.hotelname, "Отель"),
            hotel_stars: self.hotelstars,
            hotel_rating: self.hotelrating,
            country: self.countryname.clone(),
            resort: self.regionname.clone(),
            region: self.regionname.clone(),
            date_from: wire_to_iso(&self.flydate),
            date_to: end_date_iso(&self.flydate, self.nights),
            nights: self.nights,
            price: self.price_per_person,
            price_per_person: Some(self.price_per_person),
            food_type: self.meal.clone(),
            meal_description: meal_description(&self.meal),
            room_type: "Standard".to_string(),
            image_url: self.picturelink.clone(),
            hotel_link: self.fulldesclink.clone().unwrap_or_else(|| "#".to_string()),
            id: self.tourid.clone().unwrap_or_default(),
            departure_city: non_empty_or(&self.departurename, DEFAULT_DEPARTURE_CITY),
            is_hotel_only: false,
            flight_included: true,
            operator: self.operatorname.clone(),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// First `limit` hotels of a `result.php` payload (`result.hotel` may be a list or one object)
#[must_use]
pub fn summarize_hotels(payload: &Value, limit: usize) -> Vec<HotelSummary> {
    match payload.pointer("/result/hotel") {
        Some(Value::Array(hotels)) => hotels.iter().take(limit).map(HotelSummary::from_value).collect(),
        Some(hotel @ Value::Object(_)) if limit > 0 => vec![HotelSummary::from_value(hotel)],
        _ => Vec::new(),
    }
}

/// Number of hotels present in a `result.php` payload
#[must_use]
pub fn hotel_count(payload: &Value) -> usize {
    match payload.pointer("/result/hotel") {
        Some(Value::Array(hotels)) => hotels.len(),
        Some(Value::Object(_)) => 1,
        _ => 0,
    }
}

/// Hotel record reshaped for the model: descriptive fields, up to five
/// photos, coordinates and (when asked) three review excerpts with sources.
#[must_use]
pub fn hotel_profile(hotel: &Value, include_reviews: bool) -> Value {
    let field = |key: &str| hotel.get(key).cloned().unwrap_or(Value::Null);
    let collection = |key: &str, inner: &str| match hotel.get(key) {
        Some(Value::Object(wrapper)) => as_list(wrapper.get(inner)),
        other => as_list(other),
    };

    let images: Vec<Value> = collection("images", "image")
        .into_iter()
        .take(MAX_HOTEL_IMAGES)
        .collect();
    let reviews: Vec<Value> = if include_reviews {
        collection("reviews", "review")
            .iter()
            .take(MAX_REVIEWS)
            .map(|review| {
                let content = review.get("content").and_then(Value::as_str).unwrap_or_default();
                let content = if content.chars().count() > REVIEW_EXCERPT_CHARS {
                    let cut: String = content.chars().take(REVIEW_EXCERPT_CHARS).collect();
                    format!("{cut}...")
                } else {
                    content.to_string()
                };
                json!({
                    "name": review.get("name"),
                    "rate": review.get("rate"),
                    "content": content,
                    "traveltime": review.get("traveltime"),
                    "sourcelink": review.get("sourcelink").and_then(Value::as_str).unwrap_or_default(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut profile = serde_json::Map::new();
    for key in [
        "name", "stars", "rating", "country", "region", "placement", "seadistance", "build",
        "description", "territory", "inroom", "roomtypes", "beach", "child", "services",
        "servicefree", "servicepay", "meallist", "mealtypes", "animation",
    ] {
        profile.insert(key.to_string(), field(key));
    }
    profile.insert("images".into(), Value::Array(images));
    profile.insert("images_count".into(), field("imagescount"));
    profile.insert(
        "coordinates".into(),
        json!({"lat": field("coord1"), "lon": field("coord2")}),
    );
    profile.insert("reviews".into(), Value::Array(reviews));
    Value::Object(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hotel() -> Value {
        json!({
            "hotelcode": "1234",
            "hotelname": "Rixos Premium Belek",
            "hotelstars": "5",
            "hotelrating": "4.7",
            "regionname": "Белек",
            "countryname": "Турция",
            "price": "310000",
            "isphoto": 1,
            "picturelink": "https://static.tourvisor.ru/hotel_pics/1234.jpg",
            "fulldesclink": "https://tourvisor.ru/hotel/1234",
            "tours": {"tour": [{
                "tourid": 987654321,
                "price": 305000,
                "flydate": "15.06.2026",
                "nights": "7",
                "mealrussian": "Ультра всё включено",
                "room": "Deluxe Room",
                "operatorname": "Anex",
                "nightflight": "1",
                "onrequest": 0
            }]}
        })
    }

    #[test]
    fn test_hotel_projection_and_card() {
        let summary = HotelSummary::from_value(&sample_hotel());
        let card = summary.to_card("Москва");
        assert_eq!(card.hotel_name, "Rixos Premium Belek");
        assert_eq!(card.hotel_stars, 5);
        assert_eq!(card.hotel_rating, Some(4.7));
        assert_eq!(card.date_from.as_deref(), Some("2026-06-15"));
        assert_eq!(card.date_to.as_deref(), Some("2026-06-22"));
        assert_eq!(card.price, 305000);
        assert_eq!(card.price_per_person, None);
        assert_eq!(card.id, "987654321");
        assert_eq!(card.room_type, "Deluxe Room");
        assert!(card.flight_included);
        assert!(card.image_url.is_some());
    }

    #[test]
    fn test_model_view_carries_only_names_and_warnings() {
        let view = HotelSummary::from_value(&sample_hotel()).model_view();
        let keys: Vec<_> = view.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(view["warnings"], json!(["ночной перелёт"]));
        assert!(view.get("price").is_none());
    }

    #[test]
    fn test_placeholder_pictures_dropped() {
        let mut hotel = sample_hotel();
        hotel["picturelink"] = json!("https://static.tourvisor.ru/reg-12.jpg");
        assert!(HotelSummary::from_value(&hotel).picturelink.is_none());

        let mut hotel = sample_hotel();
        hotel["isphoto"] = json!(0);
        assert!(HotelSummary::from_value(&hotel).picturelink.is_none());
    }

    #[test]
    fn test_card_defaults_for_sparse_hotel() {
        let card = HotelSummary::from_value(&json!({})).to_card("Казань");
        assert_eq!(card.hotel_name, "Отель");
        assert_eq!(card.nights, 7);
        assert_eq!(card.room_type, "Standard");
        assert_eq!(card.hotel_link, "#");
        assert_eq!(card.date_from, None);
        assert_eq!(card.departure_city, "Казань");
    }

    #[test]
    fn test_hot_tour_card_is_per_person() {
        let tour = HotTourSummary::from_value(&json!({
            "hotelcode": 55,
            "hotelname": "Sunrise",
            "price": "50000",
            "priceold": "62500",
            "flydate": "01.05.2026",
            "nights": 10,
            "meal": "AI",
            "departurename": "Екатеринбург",
            "hotelpicture": "https://static.tourvisor.ru/hotel_pics/55.jpg"
        }));
        assert_eq!(tour.discount_percent, 20);
        let card = tour.to_card();
        assert_eq!(card.price, 50000);
        assert_eq!(card.price_per_person, Some(50000));
        assert_eq!(card.meal_description, "Всё включено");
        assert_eq!(card.food_type, "AI");
        assert_eq!(card.departure_city, "Екатеринбург");
        assert_eq!(card.date_to.as_deref(), Some("2026-05-11"));
    }

    #[test]
    fn test_summarize_hotels_limits_and_single_object() {
        let many = json!({"result": {"hotel": vec![sample_hotel(); 8]}});
        assert_eq!(summarize_hotels(&many, MAX_RESULT_HOTELS).len(), 5);
        assert_eq!(hotel_count(&many), 8);

        let one = json!({"result": {"hotel": sample_hotel()}});
        assert_eq!(summarize_hotels(&one, MAX_RESULT_HOTELS).len(), 1);
        assert_eq!(summarize_hotels(&json!({}), 5).len(), 0);
    }

    #[test]
    fn test_hotel_profile_limits_and_excerpts() {
        let long_review = "о".repeat(400);
        let hotel = json!({
            "name": "Gloria Serenity",
            "stars": 5,
            "coord1": "36.85",
            "coord2": "31.05",
            "imagescount": 40,
            "images": {"image": ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg"]},
            "reviews": {"review": [
                {"name": "Анна", "rate": 5, "content": long_review, "sourcelink": "https://x"},
                {"name": "Олег", "rate": 4, "content": "Отлично"},
                {"name": "Ира", "rate": 4, "content": "Хорошо"},
                {"name": "Петр", "rate": 3, "content": "Нормально"}
            ]}
        });
        let profile = hotel_profile(&hotel, true);
        assert_eq!(profile["images"].as_array().unwrap().len(), 5);
        assert_eq!(profile["images_count"], 40);
        assert_eq!(profile["coordinates"]["lat"], "36.85");
        let reviews = profile["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 3);
        let excerpt = reviews[0]["content"].as_str().unwrap();
        assert_eq!(excerpt.chars().count(), 303);
        assert!(excerpt.ends_with("..."));
        assert_eq!(reviews[1]["sourcelink"], "");

        let without = hotel_profile(&hotel, false);
        assert!(without["reviews"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_hotel_profile_single_image_string() {
        let profile = hotel_profile(&json!({"images": "only.jpg"}), false);
        assert_eq!(profile["images"], json!(["only.jpg"]));
        assert_eq!(profile["name"], Value::Null);
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(departure_city_name(5), Some("Санкт-Петербург"));
        assert_eq!(departure_city_name(99), None);
        assert_eq!(meal_description("HB+"), "Полупансион+");
        assert_eq!(meal_description("XX"), "XX");
    }
}
