quantity!(WattHours, f64, "Wh");
quantity!(KilowattHours, i64, "kWh");

impl From<WattHours> for KilowattHours {
    /// Convert to whole kilowatt-hours, rounding halves up.
    #[expect(clippy::cast_possible_truncation)]
    fn from(watt_hours: WattHours) -> Self {
        Self((watt_hours.0 / 1000.0 + 0.5).floor() as i64)
    }
}
