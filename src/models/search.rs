// src/models/search.rs
use crate::models::{colaboracao::ColaboracaoComImagens, datas};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

pub const PAGE_SIZE_PADRAO: i64 = 12;
pub const PAGE_SIZE_MAXIMO: i64 = 100;
/// Maior página aceite: `(page - 1) * page_size` nunca transborda.
pub const PAGINA_MAXIMA: i64 = i64::MAX / PAGE_SIZE_MAXIMO;

/// Filtros da busca avançada, montados a partir da query string.
///
/// Os campos de localização aceitam valores repetidos (`pais=A&pais=B`)
/// e também a forma com colchetes (`pais[]=A`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub termo: Option<String>,
    pub pais: Vec<String>,
    pub regiao: Vec<String>,
    pub estado: Vec<String>,
    pub municipio: Vec<String>,
    pub data_inicio: Option<NaiveDateTime>,
    pub data_fim: Option<NaiveDateTime>,
    pub lado_asa: Option<String>,
    pub mais_recentes: bool,
    pub page: i64,
    pub page_size: i64,
}

impl SearchFilters {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut f = SearchFilters {
            page: 1,
            page_size: PAGE_SIZE_PADRAO,
            ..Default::default()
        };

        for (chave, valor) in pairs {
            let chave = chave.strip_suffix("[]").unwrap_or(chave);
            let valor = valor.trim();
            if valor.is_empty() {
                continue;
            }
            match chave {
                "termo" => f.termo = Some(valor.to_string()),
                "pais" => f.pais.push(valor.to_string()),
                "regiao" => f.regiao.push(valor.to_string()),
                "estado" => f.estado.push(valor.to_string()),
                "municipio" => f.municipio.push(valor.to_string()),
                "dataInicio" => f.data_inicio = datas::parse_data_flexivel(valor),
                "dataFim" => f.data_fim = datas::parse_fim_do_dia(valor),
                "ladoAsa" if valor != "all" => f.lado_asa = Some(valor.to_string()),
                "ordenar" => f.mais_recentes = valor == "recent",
                "page" => {
                    f.page = valor
                        .parse::<i64>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .map(|p| p.min(PAGINA_MAXIMA))
                        .unwrap_or(1);
                }
                "pageSize" => {
                    f.page_size = valor
                        .parse::<i64>()
                        .ok()
                        .filter(|s| *s >= 1)
                        .map(|s| s.min(PAGE_SIZE_MAXIMO))
                        .unwrap_or(PAGE_SIZE_PADRAO);
                }
                _ => {}
            }
        }
        f
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Facets {
    pub pais: BTreeMap<String, i64>,
    pub regiao: BTreeMap<String, i64>,
    pub estado: BTreeMap<String, i64>,
    pub municipio: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<ColaboracaoComImagens>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub facets: Facets,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_empty() {
        let f = SearchFilters::from_pairs(&[]);
        assert_eq!(f.page, 1);
        assert_eq!(f.page_size, 12);
        assert_eq!(f.offset(), 0);
        assert!(!f.mais_recentes);
    }

    #[test]
    fn repeated_and_bracketed_keys_accumulate() {
        let f = SearchFilters::from_pairs(&pairs(&[
            ("pais", "Brasil"),
            ("pais[]", "Argentina"),
            ("estado", "  "),
            ("municipio[]", "Curitiba"),
        ]));
        assert_eq!(f.pais, vec!["Brasil", "Argentina"]);
        assert!(f.estado.is_empty());
        assert_eq!(f.municipio, vec!["Curitiba"]);
    }

    #[test]
    fn pagination_is_clamped() {
        let f = SearchFilters::from_pairs(&pairs(&[("page", "0"), ("pageSize", "500")]));
        assert_eq!((f.page, f.page_size), (1, 100));

        let f = SearchFilters::from_pairs(&pairs(&[("page", "3"), ("pageSize", "abc")]));
        assert_eq!((f.page, f.page_size), (3, 12));
        assert_eq!(f.offset(), 24);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let f = SearchFilters::from_pairs(&pairs(&[("page", "9223372036854775807"), ("pageSize", "100")]));
        assert_eq!(f.page, PAGINA_MAXIMA);
        assert!(f.offset() > 0);
        assert_eq!(f.offset(), (PAGINA_MAXIMA - 1) * 100);
    }

    #[test]
    fn lado_asa_all_means_no_filter() {
        let f = SearchFilters::from_pairs(&pairs(&[("ladoAsa", "all"), ("ordenar", "recent")]));
        assert!(f.lado_asa.is_none());
        assert!(f.mais_recentes);

        let f = SearchFilters::from_pairs(&pairs(&[("ladoAsa", "D")]));
        assert_eq!(f.lado_asa.as_deref(), Some("D"));
    }

    #[test]
    fn data_fim_covers_whole_day() {
        let f = SearchFilters::from_pairs(&pairs(&[("dataInicio", "2024-01-01"), ("dataFim", "2024-01-31")]));
        assert_eq!(f.data_inicio.unwrap().to_string(), "2024-01-01 00:00:00");
        assert_eq!(f.data_fim.unwrap().to_string(), "2024-01-31 23:59:59.999");
    }
}
