use crate::color::{self, Rgb};
use crate::csv::CsvTable;
use crate::selection::SelectionError;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;

const SPECIES_ORDER: [&str; 3] = ["Adelie", "Gentoo", "Chinstrap"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PenguinRow {
    pub species: String,
    pub island: String,
    pub bill_length_mm: f64,
    pub bill_depth_mm: f64,
    pub flipper_length_mm: f64,
    pub body_mass_g: f64,
    pub sex: String,
}

pub fn load_penguins(path: impl AsRef<Path>) -> Result<Vec<PenguinRow>> {
    let path = path.as_ref();
    info!("Loading penguins from {path:?}");
    let csv = CsvTable::read(path)?;
    penguins_from_csv(&csv).with_context(|| format!("Invalid penguins in {path:?}"))
}

pub fn penguins_from_csv(csv: &CsvTable) -> Result<Vec<PenguinRow>> {
    let species = csv.column("species")?;
    let island = csv.column("island")?;
    let bill_length = csv.column(Axis::BillLength.name())?;
    let bill_depth = csv.column(Axis::BillDepth.name())?;
    let flipper_length = csv.column(Axis::FlipperLength.name())?;
    let body_mass = csv.column(Axis::BodyMass.name())?;
    let sex = csv.column("sex")?;

    csv.records()
        .map(|record| -> Result<PenguinRow> {
            Ok(PenguinRow {
                species: record.get(species)?.to_owned(),
                island: record.get(island)?.to_owned(),
                bill_length_mm: record.parse(bill_length)?,
                bill_depth_mm: record.parse(bill_depth)?,
                flipper_length_mm: record.parse(flipper_length)?,
                body_mass_g: record.parse(body_mass)?,
                sex: record.get(sex)?.to_owned(),
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    BillLength,
    BillDepth,
    FlipperLength,
    BodyMass,
}

impl Axis {
    pub const X_OPTIONS: [Axis; 2] = [Axis::BillDepth, Axis::FlipperLength];
    pub const Y_OPTIONS: [Axis; 4] = [
        Axis::BillLength,
        Axis::BillDepth,
        Axis::FlipperLength,
        Axis::BodyMass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Axis::BillLength => "bill_length_mm",
            Axis::BillDepth => "bill_depth_mm",
            Axis::FlipperLength => "flipper_length_mm",
            Axis::BodyMass => "body_mass_g",
        }
    }

    pub fn value(self, row: &PenguinRow) -> f64 {
        match self {
            Axis::BillLength => row.bill_length_mm,
            Axis::BillDepth => row.bill_depth_mm,
            Axis::FlipperLength => row.flipper_length_mm,
            Axis::BodyMass => row.body_mass_g,
        }
    }
}

impl FromStr for Axis {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Axis::Y_OPTIONS
            .into_iter()
            .find(|axis| axis.name() == s)
            .ok_or_else(|| SelectionError::UnknownAxis(s.to_owned()))
    }
}

/// Rectangular selection on the scatterplot, bounds included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Brush {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let within = |(a, b): (f64, f64), v: f64| a.min(b) <= v && v <= a.max(b);
        within(self.x, x) && within(self.y, y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpeciesCount {
    pub species: String,
    pub total: usize,
    pub selected: usize,
}

pub fn species_color(species: &str) -> Rgb {
    match SPECIES_ORDER.iter().position(|&s| s == species) {
        Some(i) => color::categorical(i),
        None => color::categorical(SPECIES_ORDER.len()),
    }
}

fn species_cmp(a: &str, b: &str) -> Ordering {
    let position = |s: &str| SPECIES_ORDER.iter().position(|&x| x == s);
    match (position(a), position(b)) {
        (Some(i), Some(j)) => i.cmp(&j),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Scatterplot of penguin measurements with species filter and brush.
pub struct PenguinExplorer {
    rows: Vec<PenguinRow>,
    x_axis: Axis,
    y_axis: Axis,
    species: Vec<String>,
    brush: Option<Brush>,
}

impl PenguinExplorer {
    pub fn new(rows: Vec<PenguinRow>) -> Self {
        let mut explorer = PenguinExplorer {
            rows,
            x_axis: Axis::X_OPTIONS[0],
            y_axis: Axis::Y_OPTIONS[1],
            species: Vec::new(),
            brush: None,
        };
        explorer.species = explorer
            .available_species()
            .into_iter()
            .map(str::to_owned)
            .collect();
        explorer
    }

    pub fn rows(&self) -> &[PenguinRow] {
        &self.rows
    }

    pub fn x_axis(&self) -> Axis {
        self.x_axis
    }

    pub fn y_axis(&self) -> Axis {
        self.y_axis
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn brush(&self) -> Option<Brush> {
        self.brush
    }

    /// Distinct species, in display order.
    pub fn available_species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = self.rows.iter().map(|row| row.species.as_str()).collect();
        species.sort_by(|a, b| species_cmp(a, b));
        species.dedup();
        species
    }

    /// Clears the brush, whose bounds belong to the previous axes.
    pub fn set_x_axis(&mut self, axis: Axis) -> Result<(), SelectionError> {
        if !Axis::X_OPTIONS.contains(&axis) {
            return Err(SelectionError::UnknownAxis(axis.name().to_owned()));
        }
        self.x_axis = axis;
        self.brush = None;
        Ok(())
    }

    pub fn set_y_axis(&mut self, axis: Axis) {
        self.y_axis = axis;
        self.brush = None;
    }

    pub fn set_species(&mut self, species: Vec<String>) -> Result<(), SelectionError> {
        let available = self.available_species();
        if let Some(unknown) = species.iter().find(|s| !available.contains(&s.as_str())) {
            return Err(SelectionError::UnknownSpecies(unknown.clone()));
        }
        debug!("Selected species: {species:?}");
        self.species = species;
        Ok(())
    }

    pub fn set_brush(&mut self, brush: Option<Brush>) {
        self.brush = brush;
    }

    /// Rows of the selected species, inside the brush if any.
    pub fn filtered(&self) -> Vec<&PenguinRow> {
        self.rows
            .iter()
            .filter(|row| self.species.contains(&row.species))
            .filter(|row| match &self.brush {
                Some(brush) => brush.contains(self.x_axis.value(row), self.y_axis.value(row)),
                None => true,
            })
            .collect()
    }

    pub fn species_counts(&self) -> Vec<SpeciesCount> {
        let filtered = self.filtered();
        self.available_species()
            .into_iter()
            .map(|species| SpeciesCount {
                species: species.to_owned(),
                total: self.rows.iter().filter(|row| row.species == species).count(),
                selected: filtered.iter().filter(|row| row.species == species).count(),
            })
            .collect()
    }

    /// Minimum and maximum over all rows.
    pub fn range(&self, axis: Axis) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .map(|row| axis.value(row))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CSV: &str = "species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex
Adelie,Torgersen,39.1,18.7,181,3750,male
Adelie,Torgersen,39.5,17.4,186,3800,female
Gentoo,Biscoe,46.1,13.2,211,4500,female
Chinstrap,Dream,46.5,17.9,192,3500,female
Gentoo,Biscoe,50.0,16.3,230,5700,male
";

    fn explorer() -> PenguinExplorer {
        PenguinExplorer::new(penguins_from_csv(&CsvTable::parse(CSV).unwrap()).unwrap())
    }

    #[test]
    fn defaults() {
        let explorer = explorer();
        assert_eq!(explorer.rows().len(), 5);
        assert_eq!(explorer.x_axis(), Axis::BillDepth);
        assert_eq!(explorer.y_axis(), Axis::BillDepth);
        assert_eq!(explorer.species(), &["Adelie", "Gentoo", "Chinstrap"]);
        assert_eq!(explorer.filtered().len(), 5);
    }

    #[test]
    fn axis_domains() {
        let mut explorer = explorer();
        assert_eq!("body_mass_g".parse(), Ok(Axis::BodyMass));
        assert!("beak".parse::<Axis>().is_err());
        assert_eq!(
            explorer.set_x_axis(Axis::BodyMass),
            Err(SelectionError::UnknownAxis("body_mass_g".into()))
        );
        explorer.set_x_axis(Axis::FlipperLength).unwrap();
        explorer.set_y_axis(Axis::BodyMass);
        assert_eq!(explorer.range(Axis::BodyMass), Some((3500.0, 5700.0)));
    }

    #[test]
    fn brush_and_species() {
        let mut explorer = explorer();
        explorer.set_x_axis(Axis::FlipperLength).unwrap();
        explorer.set_y_axis(Axis::BodyMass);
        // Reversed bounds are accepted.
        explorer.set_brush(Some(Brush {
            x: (200.0, 180.0),
            y: (3500.0, 4500.0),
        }));
        let species: Vec<_> = explorer
            .filtered()
            .iter()
            .map(|r| r.species.as_str())
            .collect();
        assert_eq!(species, vec!["Adelie", "Adelie", "Chinstrap"]);

        explorer.set_species(vec!["Adelie".into()]).unwrap();
        assert_eq!(explorer.filtered().len(), 2);
        assert_eq!(
            explorer.species_counts(),
            vec![
                SpeciesCount {
                    species: "Adelie".into(),
                    total: 2,
                    selected: 2
                },
                SpeciesCount {
                    species: "Gentoo".into(),
                    total: 2,
                    selected: 0
                },
                SpeciesCount {
                    species: "Chinstrap".into(),
                    total: 1,
                    selected: 0
                },
            ]
        );

        assert_eq!(
            explorer.set_species(vec!["Emperor".into()]),
            Err(SelectionError::UnknownSpecies("Emperor".into()))
        );
    }

    #[test]
    fn axis_change_clears_brush() {
        let mut explorer = explorer();
        explorer.set_brush(Some(Brush {
            x: (0.0, 1.0),
            y: (0.0, 1.0),
        }));
        assert!(explorer.filtered().is_empty());
        explorer.set_y_axis(Axis::BillLength);
        assert_eq!(explorer.brush(), None);
        assert_eq!(explorer.filtered().len(), 5);
    }

    #[test]
    fn colors() {
        assert_eq!(species_color("Adelie"), color::CATEGORY10[0]);
        assert_eq!(species_color("Chinstrap"), color::CATEGORY10[2]);
        assert_eq!(species_color("Emperor"), color::CATEGORY10[3]);
    }
}
