// src/models/datas.rs
// Datas chegam do front em vários formatos (ISO completo, com ou sem fuso, ou só a data).
// Internamente guardamos sempre NaiveDateTime em UTC.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

pub fn parse_data_flexivel(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for formato in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, formato) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Como `parse_data_flexivel`, mas uma data sem hora cobre o dia inteiro.
pub fn parse_fim_do_dia(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_milli_opt(23, 59, 59, 999);
    }
    parse_data_flexivel(raw)
}

pub fn deserialize_data<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_data_flexivel(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("data inválida: '{}'", raw)))
}

pub fn deserialize_data_opcional<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_data_flexivel(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("data inválida: '{}'", raw))),
    }
}
