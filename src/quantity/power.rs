quantity!(Kilowatts, f64, "kW");
quantity!(Watts, i64, "W");

impl From<Kilowatts> for Watts {
    /// Convert to whole watts, rounding halves up.
    #[expect(clippy::cast_possible_truncation)]
    fn from(kilowatts: Kilowatts) -> Self {
        Self((kilowatts.0 * 1000.0 + 0.5).floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watts_from_kilowatts() {
        assert_eq!(Watts::from(Kilowatts(1.2345)), Watts(1235));
        assert_eq!(Watts::from(Kilowatts(0.0004)), Watts(0));
        assert_eq!(Watts::from(Kilowatts::zero()), Watts::zero());
    }

    #[test]
    fn test_negative_half_rounds_up() {
        assert_eq!(Watts::from(Kilowatts(-0.0025)), Watts(-2));
        assert_eq!(Watts::from(Kilowatts(-1.2346)), Watts(-1235));
    }
}
