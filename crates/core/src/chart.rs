//! Plotly figure JSON for the price and forecast panels.

use crate::domain::price::PriceSeries;
use crate::forecast::Forecast;
use chrono::NaiveDate;
use serde::Serialize;

pub const PRICE_TRACE_NAME: &str = "Close Price";
pub const FORECAST_TRACE_NAME: &str = "Predicted Price";
pub const FORECAST_TITLE: &str = "Predicted Stock Prices";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
}

impl Trace {
    fn lines(x: Vec<NaiveDate>, y: Vec<f64>, name: impl Into<String>) -> Self {
        Self {
            kind: "scatter",
            x,
            y,
            mode: "lines",
            name: name.into(),
            fill: None,
            line: None,
            showlegend: None,
        }
    }
}

fn title(text: impl Into<String>) -> Title {
    Title { text: text.into() }
}

pub fn price_chart(symbol: &str, series: &PriceSeries) -> Figure {
    Figure {
        data: vec![Trace::lines(
            series.dates(),
            series.closes(),
            PRICE_TRACE_NAME,
        )],
        layout: Layout {
            title: title(format!("{symbol} Live Stock Prices")),
            xaxis: Some(Axis {
                title: title("Time"),
            }),
            yaxis: Some(Axis {
                title: title("Price"),
            }),
        },
    }
}

/// Predicted line over a shaded uncertainty band.
pub fn forecast_chart(forecast: &Forecast) -> Figure {
    let dates: Vec<NaiveDate> = forecast.points.iter().map(|p| p.date).collect();
    let band_line = Some(Line {
        width: 0.0,
        color: Some("rgba(0, 123, 255, 0)"),
    });

    let lower = Trace {
        line: band_line.clone(),
        showlegend: Some(false),
        ..Trace::lines(
            dates.clone(),
            forecast.points.iter().map(|p| p.yhat_lower).collect(),
            "Lower Bound",
        )
    };
    let upper = Trace {
        fill: Some("tonexty"),
        line: band_line,
        showlegend: Some(false),
        ..Trace::lines(
            dates.clone(),
            forecast.points.iter().map(|p| p.yhat_upper).collect(),
            "Upper Bound",
        )
    };
    let predicted = Trace::lines(
        dates,
        forecast.points.iter().map(|p| p.yhat).collect(),
        FORECAST_TRACE_NAME,
    );

    Figure {
        data: vec![lower, upper, predicted],
        layout: Layout {
            title: title(FORECAST_TITLE),
            xaxis: None,
            yaxis: None,
        },
    }
}
