use chrono::NaiveDate;

/// Whole nights between check-in and check-out, floored at zero.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(0)
}

pub fn total(nights: i64, price_per_night: i64) -> i64 {
    nights * price_per_night
}

/// Validates a requested stay and returns its length in nights.
pub fn validate(check_in: NaiveDate, check_out: NaiveDate) -> Result<i64, &'static str> {
    if check_out <= check_in {
        return Err("Check-out date must be after check-in date");
    }
    Ok(nights(check_in, check_out))
}
