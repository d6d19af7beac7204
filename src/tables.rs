use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{power_flow::PowerFlowReadings, yearly_totals::YearRecord},
    quantity::{energy::KilowattHours, power::Watts},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_power_flow_table(readings: &PowerFlowReadings) -> Table {
    fn power_cell(power: Option<Watts>) -> Cell {
        match power {
            Some(power) => Cell::new(power).set_alignment(CellAlignment::Right).fg(
                if power < Watts::zero() { Color::Green } else { Color::Reset },
            ),
            None => Cell::new("—").add_attribute(Attribute::Dim),
        }
    }

    let mut table = new_table();
    table.set_header(vec!["Load", "Grid", "Solar", "Available"]);
    table.add_row(vec![
        power_cell(readings.load),
        power_cell(readings.grid),
        power_cell(readings.solar),
        Cell::new(if readings.is_available { "yes" } else { "no" }).fg(
            if readings.is_available { Color::Green } else { Color::Red },
        ),
    ]);
    table
}

pub fn build_year_records_table(records: impl IntoIterator<Item = (i32, YearRecord)>) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Year"),
        Cell::new("Status"),
        Cell::new("Imported").set_alignment(CellAlignment::Right),
        Cell::new("Exported").set_alignment(CellAlignment::Right),
    ]);
    for (year, record) in records {
        let row = match record {
            YearRecord::Computed { imported, exported } => vec![
                Cell::new(year),
                Cell::new("computed").fg(Color::Green),
                Cell::new(KilowattHours::from(imported)).set_alignment(CellAlignment::Right),
                Cell::new(KilowattHours::from(exported)).set_alignment(CellAlignment::Right),
            ],
            YearRecord::Missing => vec![
                Cell::new(year),
                Cell::new("missing").add_attribute(Attribute::Dim),
                Cell::new(""),
                Cell::new(""),
            ],
            YearRecord::Error => vec![
                Cell::new(year),
                Cell::new("error").fg(Color::Red),
                Cell::new(""),
                Cell::new(""),
            ],
        };
        table.add_row(row);
    }
    table
}
