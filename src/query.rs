use serde::Deserialize;

use crate::models::RoomRow;
use crate::respond::Pagination;

pub const DEFAULT_PAGE_SIZE: i64 = 8;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Query surface of the room listing endpoints. All filters are optional and
/// combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomQuery {
    pub keyword: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub min_bedrooms: Option<i64>,
    pub min_guests: Option<i64>,
    /// Comma-separated amenity names, e.g. `wifi,pool`.
    pub amenities: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagedQuery {
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amenity {
    Wifi,
    Kitchen,
    AirConditioning,
    Pool,
    Washer,
    Parking,
    Tv,
    Iron,
}

impl Amenity {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wifi" => Some(Self::Wifi),
            "kitchen" => Some(Self::Kitchen),
            "air_conditioning" | "ac" => Some(Self::AirConditioning),
            "pool" => Some(Self::Pool),
            "washer" => Some(Self::Washer),
            "parking" => Some(Self::Parking),
            "tv" => Some(Self::Tv),
            "iron" => Some(Self::Iron),
            _ => None,
        }
    }

    fn is_set(self, room: &RoomRow) -> bool {
        let flag = match self {
            Self::Wifi => room.wifi,
            Self::Kitchen => room.kitchen,
            Self::AirConditioning => room.air_conditioning,
            Self::Pool => room.pool,
            Self::Washer => room.washer,
            Self::Parking => room.parking,
            Self::Tv => room.tv,
            Self::Iron => room.iron,
        };
        flag == 1
    }
}

/// Parses the comma-separated amenity list, rejecting unknown names so typos
/// surface as a 400 instead of an always-empty result.
pub fn parse_amenities(raw: Option<&str>) -> Result<Vec<Amenity>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            Amenity::parse(part).ok_or_else(|| format!("Unknown amenity: {}", part.trim()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "name_asc" => Some(Self::NameAsc),
            "name_desc" => Some(Self::NameDesc),
            _ => None,
        }
    }
}

/// Keyword match is a case-insensitive substring test on the name field.
pub fn keyword_matches(name: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    keyword.is_empty() || name.to_lowercase().contains(&keyword.to_lowercase())
}

pub fn filter_rooms(rooms: Vec<RoomRow>, query: &RoomQuery, amenities: &[Amenity]) -> Vec<RoomRow> {
    rooms
        .into_iter()
        .filter(|room| {
            if let Some(keyword) = query.keyword.as_deref() {
                if !keyword_matches(&room.name, keyword) {
                    return false;
                }
            }
            if let Some(min) = query.price_min {
                if room.price < min {
                    return false;
                }
            }
            if let Some(max) = query.price_max {
                if room.price > max {
                    return false;
                }
            }
            if let Some(min) = query.min_bedrooms {
                if room.bedrooms < min {
                    return false;
                }
            }
            if let Some(min) = query.min_guests {
                if room.guests < min {
                    return false;
                }
            }
            amenities.iter().all(|amenity| amenity.is_set(room))
        })
        .collect()
}

pub fn sort_rooms(rooms: &mut [RoomRow], key: SortKey) {
    match key {
        SortKey::PriceAsc => rooms.sort_by_key(|room| room.price),
        SortKey::PriceDesc => rooms.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::NameAsc => rooms.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortKey::NameDesc => {
            rooms.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()))
        }
    }
}

/// Plain slice pagination: page N covers `(N-1)*size .. N*size`. A page past
/// the end is an empty list, and total pages always reflect the filtered
/// length.
pub fn paginate<T>(items: Vec<T>, page: Option<i64>, page_size: Option<i64>) -> (Vec<T>, Pagination) {
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);

    let total_row = items.len() as i64;
    let total_pages = (total_row + page_size - 1) / page_size;

    // page is caller-supplied; an overflowing offset is just past the end
    let start = (page - 1)
        .checked_mul(page_size)
        .and_then(|offset| usize::try_from(offset).ok());
    let slice = match start {
        Some(start) if start < items.len() => items
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect(),
        _ => Vec::new(),
    };

    (
        slice,
        Pagination {
            total_pages,
            total_row,
        },
    )
}
