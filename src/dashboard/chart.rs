//! Chart Feed
//!
//! Data handed to the line chart: one point per filtered reading and three
//! series (water, electricity, gas) against the reading date.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Reading, Resource};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub water: f64,
    pub electricity: f64,
    pub gas: f64,
}

impl ChartPoint {
    pub fn value(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Water => self.water,
            Resource::Electricity => self.electricity,
            Resource::Gas => self.gas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub resource: Resource,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub points: Vec<ChartPoint>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let points = readings
            .iter()
            .map(|r| ChartPoint {
                date: r.reading_date,
                water: r.water,
                electricity: r.electricity,
                gas: r.gas,
            })
            .collect();

        Self {
            points,
            series: default_series(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest value across all series, used to scale the y axis
    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .flat_map(|p| Resource::ALL.map(|r| p.value(r)))
            .fold(0.0, f64::max)
    }
}

fn default_series() -> Vec<ChartSeries> {
    vec![
        ChartSeries {
            resource: Resource::Water,
            label: "Water",
            color: "#8884d8",
        },
        ChartSeries {
            resource: Resource::Electricity,
            label: "Electricity",
            color: "#82ca9d",
        },
        ChartSeries {
            resource: Resource::Gas,
            label: "Gas",
            color: "#ffc658",
        },
    ]
}
