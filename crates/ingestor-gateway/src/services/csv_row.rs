//! `POST /csv-row-process`: Celsius to Fahrenheit for one CSV row.

use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use ingestor_core::convert::{parse_temperature, TemperatureReading};
use ingestor_core::error::{IngestError, Result};

use super::{parse_json, with_subject, NO_DATA};
use crate::error::ApiError;
use crate::obs::timing::RequestSubject;

pub const TEMPERATURE_FIELD: &str = "AvgTemperature";

#[derive(Debug, Deserialize)]
struct CsvRowUpload {
    #[serde(default)]
    data: Option<Value>,
}

pub async fn csv_row_process(body: Bytes) -> Response {
    let req: CsvRowUpload = match parse_json(&body) {
        Ok(req) => req,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let subject = req.data.as_ref().map(RequestSubject::data);
    with_subject(convert(req.data), subject)
}

fn convert(data: Option<Value>) -> std::result::Result<String, ApiError> {
    let row = match data {
        Some(Value::Object(row)) => row,
        None | Some(Value::Null) => return Err(IngestError::Validation(NO_DATA.into()).into()),
        Some(_) => return Err(IngestError::Validation("data must be an object".into()).into()),
    };

    let reading = TemperatureReading::from_celsius(temperature(&row)?)?;
    Ok(format!(
        "Data processed successfully: {}\nFahrenheit: {}\nCelsius: {}",
        Value::Object(row),
        reading.fahrenheit,
        reading.celsius
    ))
}

/// Accepts a JSON number or a numeric string.
fn temperature(row: &Map<String, Value>) -> Result<f64> {
    match row.get(TEMPERATURE_FIELD) {
        None | Some(Value::Null) => Err(IngestError::Validation(format!(
            "data.{TEMPERATURE_FIELD} is required"
        ))),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            IngestError::Validation(format!("data.{TEMPERATURE_FIELD} is out of range"))
        }),
        Some(Value::String(s)) => parse_temperature(s),
        Some(_) => Err(IngestError::Validation(format!(
            "data.{TEMPERATURE_FIELD} must be numeric"
        ))),
    }
}
