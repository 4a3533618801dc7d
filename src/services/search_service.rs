// src/services/search_service.rs
// Busca avançada: filtros dinâmicos, paginação e contadores por localização.
use crate::{
    error::AppResult,
    models::{
        colaboracao::{Colaboracao, ColaboracaoComImagens},
        search::{Facets, SearchFilters, SearchResponse},
    },
    services::imagem_service,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Local {
    Pais,
    Regiao,
    Estado,
    Municipio,
}

impl Local {
    const TODOS: [Local; 4] = [Local::Pais, Local::Regiao, Local::Estado, Local::Municipio];

    fn coluna(&self) -> &'static str {
        match self {
            Local::Pais => "c.pais",
            Local::Regiao => "c.regiao",
            Local::Estado => "c.estado",
            Local::Municipio => "c.municipio",
        }
    }

    fn valores<'a>(&self, f: &'a SearchFilters) -> &'a [String] {
        match self {
            Local::Pais => &f.pais,
            Local::Regiao => &f.regiao,
            Local::Estado => &f.estado,
            Local::Municipio => &f.municipio,
        }
    }
}

/// Maiúsculas acentuadas que o `LOWER` do SQLite não converte.
const ACENTUADAS: [(char, char); 15] = [
    ('Á', 'á'), ('À', 'à'), ('Â', 'â'), ('Ã', 'ã'), ('Ä', 'ä'),
    ('É', 'é'), ('Ê', 'ê'), ('Í', 'í'), ('Ó', 'ó'), ('Ô', 'ô'),
    ('Õ', 'õ'), ('Ö', 'ö'), ('Ú', 'ú'), ('Ü', 'ü'), ('Ç', 'ç'),
];

/// `LOWER(coluna)` que também converte as maiúsculas de `ACENTUADAS`.
fn minusculas(coluna: &str) -> String {
    ACENTUADAS
        .iter()
        .fold(format!("LOWER({})", coluna), |expr, (maiuscula, minuscula)| {
            format!("REPLACE({}, '{}', '{}')", expr, maiuscula, minuscula)
        })
}

/// `status = 'Aprovada'` e o termo de busca.
fn push_base<'a>(qb: &mut QueryBuilder<'a, Sqlite>, f: &'a SearchFilters) {
    qb.push(" WHERE c.status = 'Aprovada'");
    if let Some(termo) = &f.termo {
        qb.push(format!(" AND {} LIKE ", minusculas("c.nome_especie")))
            .push_bind(format!("%{}%", termo.to_lowercase()));
    }
}

/// Filtros `IN (...)` de localização, exceto `ignorar`.
fn push_locais<'a>(qb: &mut QueryBuilder<'a, Sqlite>, f: &'a SearchFilters, ignorar: Option<Local>) {
    for local in Local::TODOS {
        if Some(local) == ignorar {
            continue;
        }
        let valores = local.valores(f);
        if valores.is_empty() {
            continue;
        }
        qb.push(format!(" AND {} IN (", local.coluna()));
        let mut separated = qb.separated(", ");
        for valor in valores {
            separated.push_bind(valor.as_str());
        }
        separated.push_unseparated(")");
    }
}

/// Datas e lado da asa (só afetam os resultados, não os contadores).
fn push_datas_e_lado<'a>(qb: &mut QueryBuilder<'a, Sqlite>, f: &'a SearchFilters) {
    if let Some(inicio) = f.data_inicio {
        qb.push(" AND c.data >= ").push_bind(inicio);
    }
    if let Some(fim) = f.data_fim {
        qb.push(" AND c.data <= ").push_bind(fim);
    }
    if let Some(lado) = &f.lado_asa {
        qb.push(
            r#" AND EXISTS (
                SELECT 1 FROM imagens img
                WHERE img.colaboracao_id = c.colaboracao_id
                  AND (img.status = 'Aprovada' OR img.status IS NULL)
                  AND substr(img.codigo_imagem, -1) = "#,
        )
        .push_bind(lado.as_str())
        .push(")");
    }
}

fn push_todos_filtros<'a>(qb: &mut QueryBuilder<'a, Sqlite>, f: &'a SearchFilters) {
    push_base(qb, f);
    push_locais(qb, f, None);
    push_datas_e_lado(qb, f);
}

pub async fn search(db_pool: &SqlitePool, filters: &SearchFilters) -> AppResult<SearchResponse> {
    tracing::debug!("Busca avançada: {:?}", filters);

    let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM colaboracoes c");
    push_todos_filtros(&mut count_qb, filters);
    let total = count_qb.build_query_scalar::<i64>().fetch_one(db_pool).await?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT c.* FROM colaboracoes c");
    push_todos_filtros(&mut qb, filters);
    let direcao = if filters.mais_recentes { "DESC" } else { "ASC" };
    qb.push(format!(" ORDER BY c.data {0}, c.colaboracao_id {0}", direcao));
    qb.push(" LIMIT ").push_bind(filters.page_size);
    qb.push(" OFFSET ").push_bind(filters.offset());
    let colaboracoes = qb.build_query_as::<Colaboracao>().fetch_all(db_pool).await?;

    let ids: Vec<i64> = colaboracoes.iter().map(|c| c.colaboracao_id).collect();
    let mut imagens = imagem_service::find_by_colaboracoes(db_pool, &ids, true).await?;
    let results = colaboracoes
        .into_iter()
        .map(|c| ColaboracaoComImagens {
            imagens: imagens.remove(&c.colaboracao_id).unwrap_or_default(),
            colaboracao: c,
        })
        .collect();

    let facets = facets(db_pool, filters).await?;
    let total_pages = (total + filters.page_size - 1) / filters.page_size;

    tracing::debug!("Busca devolveu {} de {} resultados", ids.len(), total);
    Ok(SearchResponse {
        results,
        total,
        page: filters.page,
        page_size: filters.page_size,
        total_pages,
        facets,
    })
}

async fn contar_por(
    db_pool: &SqlitePool,
    filters: &SearchFilters,
    local: Local,
) -> AppResult<BTreeMap<String, i64>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} AS valor, COUNT(*) AS total FROM colaboracoes c", local.coluna()));
    push_base(&mut qb, filters);
    push_locais(&mut qb, filters, Some(local));
    qb.push(format!(" GROUP BY {}", local.coluna()));

    let linhas = qb.build_query_as::<(String, i64)>().fetch_all(db_pool).await?;
    Ok(linhas.into_iter().collect())
}

/// Cada contador aplica os outros filtros de localização, mas não o seu.
pub async fn facets(db_pool: &SqlitePool, filters: &SearchFilters) -> AppResult<Facets> {
    Ok(Facets {
        pais: contar_por(db_pool, filters, Local::Pais).await?,
        regiao: contar_por(db_pool, filters, Local::Regiao).await?,
        estado: contar_por(db_pool, filters, Local::Estado).await?,
        municipio: contar_por(db_pool, filters, Local::Municipio).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_pool,
        models::{colaboracao::StatusColaboracao, imagem::StatusImagem},
        services::colaboracao_service,
        test_support::{nova_colaboracao, seed_user},
    };
    use chrono::NaiveDate;

    fn pairs(raw: &[(&str, &str)]) -> SearchFilters {
        let raw: Vec<(String, String)> = raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        SearchFilters::from_pairs(&raw)
    }

    async fn aprovada(pool: &SqlitePool, user_id: i64, especie: &str, pais: &str, estado: &str, dia: u32) -> i64 {
        let mut payload = nova_colaboracao(especie);
        payload.pais = pais.into();
        payload.estado = estado.into();
        payload.data = NaiveDate::from_ymd_opt(2024, 5, dia).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let c = colaboracao_service::create(pool, user_id, &payload).await.unwrap();
        colaboracao_service::update_status(pool, c.colaboracao_id, StatusColaboracao::Aprovada)
            .await
            .unwrap();
        c.colaboracao_id
    }

    async fn cenario() -> SqlitePool {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let uid = user.user_id;
        aprovada(&pool, uid, "Apis mellifera", "Brasil", "Goiás", 1).await;
        aprovada(&pool, uid, "Apis cerana", "Brasil", "Bahia", 2).await;
        aprovada(&pool, uid, "Melipona quadrifasciata", "Brasil", "Goiás", 3).await;
        aprovada(&pool, uid, "Apis mellifera", "Argentina", "Córdoba", 4).await;
        // Em análise: nunca aparece na busca
        colaboracao_service::create(&pool, uid, &nova_colaboracao("Apis mellifera")).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn only_approved_and_term_is_case_insensitive() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[])).await.unwrap();
        assert_eq!(r.total, 4);

        let r = search(&pool, &pairs(&[("termo", "APIS")])).await.unwrap();
        assert_eq!(r.total, 3);
    }

    #[tokio::test]
    async fn term_folds_accented_capitals() {
        let pool = test_pool().await;
        let autor = seed_user(&pool, "autor@x.com").await;
        aprovada(&pool, autor.user_id, "Ácaro Çerrado", "Brasil", "Goiás", 1).await;

        for termo in ["ácaro", "ÁCARO", "çerr", "ÇERRADO"] {
            let r = search(&pool, &pairs(&[("termo", termo)])).await.unwrap();
            assert_eq!(r.total, 1, "termo {}", termo);
        }
        let r = search(&pool, &pairs(&[("termo", "acaro")])).await.unwrap();
        assert_eq!(r.total, 0);
    }

    #[tokio::test]
    async fn location_lists_and_order() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[("estado", "Goiás"), ("estado[]", "Bahia"), ("ordenar", "recent")]))
            .await
            .unwrap();
        assert_eq!(r.total, 3);
        let especies: Vec<_> = r.results.iter().map(|c| c.colaboracao.nome_especie.as_str()).collect();
        assert_eq!(especies, vec!["Melipona quadrifasciata", "Apis cerana", "Apis mellifera"]);
    }

    #[tokio::test]
    async fn pagination_reports_total_pages() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[("pageSize", "3"), ("page", "2")])).await.unwrap();
        assert_eq!(r.total, 4);
        assert_eq!(r.total_pages, 2);
        assert_eq!(r.results.len(), 1);
        assert_eq!(r.results[0].colaboracao.pais, "Argentina");
    }

    #[tokio::test]
    async fn huge_page_returns_empty_results() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[("page", "9223372036854775807")])).await.unwrap();
        assert!(r.results.is_empty());
        assert_eq!(r.total, 4);
        assert_eq!(r.total_pages, 1);
    }

    #[tokio::test]
    async fn date_range_includes_whole_end_day() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[("dataInicio", "2024-05-02"), ("dataFim", "2024-05-03")]))
            .await
            .unwrap();
        assert_eq!(r.total, 2);
    }

    #[tokio::test]
    async fn facets_ignore_their_own_filter() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[("pais", "Brasil"), ("estado", "Goiás")])).await.unwrap();
        assert_eq!(r.total, 2);

        // país: só aplica estado=Goiás
        assert_eq!(r.facets.pais.get("Brasil"), Some(&2));
        assert_eq!(r.facets.pais.get("Argentina"), None);
        // estado: só aplica país=Brasil
        assert_eq!(r.facets.estado.get("Goiás"), Some(&2));
        assert_eq!(r.facets.estado.get("Bahia"), Some(&1));
        assert_eq!(r.facets.estado.get("Córdoba"), None);
        // município: aplica os dois
        assert_eq!(r.facets.municipio.get("Pirenópolis"), Some(&2));
    }

    #[tokio::test]
    async fn lado_asa_matches_last_char_of_approved_images() {
        let pool = cenario().await;
        let r = search(&pool, &pairs(&[])).await.unwrap();
        let primeira = r.results[0].colaboracao.colaboracao_id;
        let segunda = r.results[1].colaboracao.colaboracao_id;

        let img = imagem_service::insert(&pool, primeira, "11ABD", "https://h/a.jpg", "").await.unwrap();
        imagem_service::update_status(&pool, img.imagem_id, StatusImagem::Aprovada).await.unwrap();
        // Ainda em análise: não conta
        imagem_service::insert(&pool, segunda, "12ABD", "https://h/b.jpg", "").await.unwrap();

        let r = search(&pool, &pairs(&[("ladoAsa", "D")])).await.unwrap();
        assert_eq!(r.total, 1);
        assert_eq!(r.results[0].colaboracao.colaboracao_id, primeira);
        assert_eq!(r.results[0].imagens.len(), 1);

        let r = search(&pool, &pairs(&[("ladoAsa", "all")])).await.unwrap();
        assert_eq!(r.total, 4);
        let sem_aprovadas = r.results.iter().find(|c| c.colaboracao.colaboracao_id == segunda).unwrap();
        assert!(sem_aprovadas.imagens.is_empty());
    }
}
