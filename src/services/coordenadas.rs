// src/services/coordenadas.rs
// Normaliza latitude/longitude para texto decimal com 6 casas.
// Aceita número, texto decimal ("-23,5") ou graus/minutos/segundos ("11°31’5.02”S").
use crate::{
    error::{AppError, AppResult},
    models::colaboracao::CoordenadaInput,
};
use regex::Regex;
use std::sync::LazyLock;

static DMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\D+(\d+(?:[.,]\d+)?)\D+(\d+(?:[.,]\d+)?)(?:\D*?([NnSsEeWwOo]))?")
        .expect("regex DMS válida")
});

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").expect("regex decimal válida"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eixo {
    Latitude,
    Longitude,
}

impl Eixo {
    fn limite(&self) -> f64 {
        match self {
            Eixo::Latitude => 90.0,
            Eixo::Longitude => 180.0,
        }
    }

    fn nome(&self) -> &'static str {
        match self {
            Eixo::Latitude => "latitude",
            Eixo::Longitude => "longitude",
        }
    }
}

fn numero(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

fn texto_para_decimal(raw: &str) -> Option<f64> {
    let s = raw
        .trim()
        .replace(['’', '‘', '′'], "'")
        .replace(['”', '“', '″'], "\"")
        .replace(['º', '˚'], "°");
    if s.is_empty() {
        return None;
    }

    if let Some(c) = DMS.captures(&s) {
        let graus = numero(&c[1])?;
        let minutos = numero(&c[2])?;
        let segundos = numero(&c[3])?;
        let mut decimal = graus + minutos / 60.0 + segundos / 3600.0;

        let direcao = c.get(4).map(|m| m.as_str().to_ascii_uppercase());
        // "O" (oeste) é comum em dados em português
        let negativo = matches!(direcao.as_deref(), Some("S" | "W" | "O")) || s.starts_with('-');
        if negativo {
            decimal = -decimal.abs();
        }
        return Some(decimal);
    }

    DECIMAL.find(&s).and_then(|m| numero(m.as_str()))
}

/// Converte a coordenada recebida em texto com 6 casas decimais.
pub fn normalizar(input: &CoordenadaInput, eixo: Eixo) -> AppResult<String> {
    let valor = match input {
        CoordenadaInput::Numero(n) => Some(*n),
        CoordenadaInput::Texto(s) => texto_para_decimal(s),
    };

    let valor = valor.filter(|v| v.is_finite()).ok_or_else(|| {
        AppError::BadRequest(format!("Valor de {} inválido.", eixo.nome()))
    })?;

    if valor.abs() > eixo.limite() {
        return Err(AppError::BadRequest(format!(
            "{} fora do intervalo permitido (±{}).",
            eixo.nome(),
            eixo.limite()
        )));
    }

    Ok(format!("{:.6}", valor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texto(s: &str) -> CoordenadaInput {
        CoordenadaInput::Texto(s.into())
    }

    #[test]
    fn dms_with_hemisphere() {
        assert_eq!(normalizar(&texto("11°31’5.02”S"), Eixo::Latitude).unwrap(), "-11.518061");
        assert_eq!(normalizar(&texto("48°15'30\"W"), Eixo::Longitude).unwrap(), "-48.258333");
        assert_eq!(normalizar(&texto("48º15'30\" O"), Eixo::Longitude).unwrap(), "-48.258333");
        assert_eq!(normalizar(&texto("5°0'0\"N"), Eixo::Latitude).unwrap(), "5.000000");
    }

    #[test]
    fn decimal_text_and_numbers() {
        assert_eq!(normalizar(&texto("-23,55052"), Eixo::Latitude).unwrap(), "-23.550520");
        assert_eq!(normalizar(&texto(" -46.633308 "), Eixo::Longitude).unwrap(), "-46.633308");
        assert_eq!(normalizar(&CoordenadaInput::Numero(-15.5), Eixo::Latitude).unwrap(), "-15.500000");
    }

    #[test]
    fn rejects_garbage_and_out_of_range() {
        assert!(normalizar(&texto("sem coordenada"), Eixo::Latitude).is_err());
        assert!(normalizar(&texto(""), Eixo::Latitude).is_err());
        assert!(normalizar(&CoordenadaInput::Numero(91.0), Eixo::Latitude).is_err());
        assert!(normalizar(&CoordenadaInput::Numero(-180.0), Eixo::Longitude).is_ok());
    }
}
