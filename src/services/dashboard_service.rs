// src/services/dashboard_service.rs
// Agregações do painel administrativo.
use crate::{
    error::{AppError, AppResult},
    models::{
        dashboard::{
            Agrupamento, Atividade, AtividadeEntity, AtividadeUser, AtividadesQuery, AtividadesResponse,
            Contagem, DashboardSummary, Dimensao, DistribuicaoResponse, Metrica, Periodo, PeriodoQuery,
            PontoSerie, SerieQuery, SerieResponse, TipoAtividade, TopResponse, UsersByType,
        },
        datas,
    },
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, SqlitePool};

const LIMITE_ATIVIDADES_PADRAO: i64 = 20;
const LIMITE_ATIVIDADES_MAXIMO: i64 = 100;

fn periodo_invalido() -> AppError {
    AppError::InvalidParam {
        code: "invalid_period",
        message: "Período inválido. Use 7d, 30d, 90d ou todo.".into(),
    }
}

fn intervalo_invalido() -> AppError {
    AppError::InvalidParam {
        code: "invalid_date_range",
        message: "Range de datas inválido. Verifique o formato ISO 8601 e se from < to.".into(),
    }
}

fn nao_vazio(valor: &Option<String>) -> Option<&str> {
    valor.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve `period` / `from` + `to` num intervalo concreto.
pub fn parse_periodo(query: &PeriodoQuery, agora: DateTime<Utc>) -> AppResult<Periodo> {
    let period = nao_vazio(&query.period);

    if matches!(period, Some("todo" | "all")) {
        let inicio = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(AppError::InternalServerError)?;
        return Ok(Periodo {
            from: inicio.and_utc(),
            to: agora,
        });
    }

    if let (Some(from), Some(to)) = (nao_vazio(&query.from), nao_vazio(&query.to)) {
        let from = datas::parse_data_flexivel(from).ok_or_else(intervalo_invalido)?.and_utc();
        let to = datas::parse_data_flexivel(to).ok_or_else(intervalo_invalido)?.and_utc();
        if from >= to || to - from > Duration::days(365) {
            return Err(intervalo_invalido());
        }
        return Ok(Periodo { from, to });
    }

    let dias = match period.unwrap_or("30d") {
        "7d" => 7,
        "30d" => 30,
        "90d" => 90,
        _ => return Err(periodo_invalido()),
    };
    Ok(Periodo {
        from: agora - Duration::days(dias),
        to: agora,
    })
}

fn limites(periodo: &Periodo) -> (NaiveDateTime, NaiveDateTime) {
    (periodo.from.naive_utc(), periodo.to.naive_utc())
}

// Limite opcional, limitado a [1, maximo]; texto inválido usa o padrão.
fn limite_com_teto(raw: &Option<String>, padrao: i64, maximo: i64) -> i64 {
    nao_vazio(raw)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v != 0)
        .unwrap_or(padrao)
        .clamp(1, maximo)
}

async fn contar(db_pool: &SqlitePool, sql: &str) -> AppResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(db_pool).await?)
}

async fn contar_no_periodo(db_pool: &SqlitePool, sql: &str, periodo: &Periodo) -> AppResult<i64> {
    let (from, to) = limites(periodo);
    Ok(sqlx::query_scalar::<_, i64>(sql)
        .bind(from)
        .bind(to)
        .fetch_one(db_pool)
        .await?)
}

pub async fn summary(db_pool: &SqlitePool, periodo: Periodo) -> AppResult<DashboardSummary> {
    tracing::debug!("Resumo do painel entre {} e {}", periodo.from, periodo.to);

    let total_users = contar(db_pool, "SELECT COUNT(*) FROM users").await?;
    let total_images = contar(db_pool, "SELECT COUNT(*) FROM imagens").await?;
    let pending_collaborations =
        contar(db_pool, "SELECT COUNT(*) FROM colaboracoes WHERE status = 'Em analise'").await?;
    let pending_images = contar(db_pool, "SELECT COUNT(*) FROM imagens WHERE status = 'Análise'").await?;
    let new_users_this_period = contar_no_periodo(
        db_pool,
        "SELECT COUNT(*) FROM users WHERE created_at BETWEEN ? AND ?",
        &periodo,
    )
    .await?;
    let new_images_this_period = contar_no_periodo(
        db_pool,
        r#"
        SELECT COUNT(*) FROM imagens i
        JOIN colaboracoes c ON c.colaboracao_id = i.colaboracao_id
        WHERE c.created_at BETWEEN ? AND ?
        "#,
        &periodo,
    )
    .await?;

    let por_tipo = sqlx::query_as::<_, (String, i64)>("SELECT tipo, COUNT(*) FROM users GROUP BY tipo")
        .fetch_all(db_pool)
        .await?;
    let mut users_by_type = UsersByType::default();
    for (tipo, total) in por_tipo {
        match tipo.as_str() {
            "Comum" => users_by_type.common = total,
            "Colaborador" => users_by_type.collaborator = total,
            "Admin" => users_by_type.admin = total,
            _ => {}
        }
    }

    Ok(DashboardSummary {
        total_users,
        total_images,
        pending_collaborations,
        pending_images,
        new_users_this_period,
        new_images_this_period,
        users_by_type,
        period: periodo.into(),
    })
}

// --- Atividades ---

#[derive(Debug, FromRow)]
struct AtividadeRow {
    entidade_id: i64,
    user_id: i64,
    nome: String,
    quando: NaiveDateTime,
    status: Option<String>,
}

struct Fonte {
    colunas: &'static str,
    origem: &'static str,
    filtro: &'static str,
    ordem: &'static str,
}

fn fonte(tipo: TipoAtividade) -> Fonte {
    const IMAGENS: &str = r#"
        FROM imagens i
        JOIN colaboracoes c ON c.colaboracao_id = i.colaboracao_id
        JOIN users u ON u.user_id = c.user_id
        WHERE c.created_at BETWEEN ? AND ?"#;
    const COLUNAS_IMAGEM: &str =
        "i.imagem_id AS entidade_id, u.user_id, u.nome_completo AS nome, c.created_at AS quando, i.status";
    const ORDEM_IMAGEM: &str = "c.created_at DESC, i.imagem_id DESC";

    match tipo {
        TipoAtividade::UserRegistration => Fonte {
            colunas: "u.user_id AS entidade_id, u.user_id, u.nome_completo AS nome, u.created_at AS quando, NULL AS status",
            origem: "FROM users u WHERE u.created_at BETWEEN ? AND ?",
            filtro: "",
            ordem: "u.created_at DESC, u.user_id DESC",
        },
        TipoAtividade::CollaborationSubmitted => Fonte {
            colunas: "c.colaboracao_id AS entidade_id, u.user_id, u.nome_completo AS nome, c.created_at AS quando, c.status",
            origem: r#"
                FROM colaboracoes c
                JOIN users u ON u.user_id = c.user_id
                WHERE c.created_at BETWEEN ? AND ?"#,
            filtro: "",
            ordem: "c.created_at DESC, c.colaboracao_id DESC",
        },
        TipoAtividade::ImageUpload => Fonte {
            colunas: COLUNAS_IMAGEM,
            origem: IMAGENS,
            filtro: "",
            ordem: ORDEM_IMAGEM,
        },
        TipoAtividade::ImageApproved => Fonte {
            colunas: COLUNAS_IMAGEM,
            origem: IMAGENS,
            filtro: " AND i.status = 'Aprovada'",
            ordem: ORDEM_IMAGEM,
        },
        TipoAtividade::ImageRejected => Fonte {
            colunas: COLUNAS_IMAGEM,
            origem: IMAGENS,
            filtro: " AND i.status = 'Reprovada'",
            ordem: ORDEM_IMAGEM,
        },
    }
}

fn para_atividade(tipo: TipoAtividade, row: AtividadeRow) -> Atividade {
    let (id, description, entity_tipo, entity_id) = match tipo {
        TipoAtividade::UserRegistration => (
            format!("user_{}", row.entidade_id),
            "Novo usuário registrado",
            "user",
            format!("u_{}", row.entidade_id),
        ),
        TipoAtividade::CollaborationSubmitted => (
            format!("collab_{}", row.entidade_id),
            "Nova colaboração enviada",
            "collaboration",
            format!("collab_{}", row.entidade_id),
        ),
        TipoAtividade::ImageUpload => (
            format!("img_{}", row.entidade_id),
            "Nova imagem enviada",
            "image",
            format!("img_{}", row.entidade_id),
        ),
        TipoAtividade::ImageApproved => (
            format!("img_{}_approved", row.entidade_id),
            "Imagem aprovada",
            "image",
            format!("img_{}", row.entidade_id),
        ),
        TipoAtividade::ImageRejected => (
            format!("img_{}_rejected", row.entidade_id),
            "Imagem reprovada",
            "image",
            format!("img_{}", row.entidade_id),
        ),
    };
    let quando = row.quando.and_utc();

    Atividade {
        id,
        tipo: tipo.as_str(),
        description,
        date: quando.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        user: AtividadeUser {
            id: format!("u_{}", row.user_id),
            name: row.nome,
        },
        entity: AtividadeEntity {
            tipo: entity_tipo,
            id: entity_id,
            status: row.status,
        },
        quando,
    }
}

/// Valida `types` (lista separada por vírgulas). Vazio significa todos.
pub fn parse_tipos(raw: &Option<String>) -> AppResult<Vec<TipoAtividade>> {
    let Some(raw) = nao_vazio(raw) else {
        return Ok(TipoAtividade::TODOS.to_vec());
    };

    let mut tipos = Vec::new();
    let mut invalidos = Vec::new();
    for parte in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match TipoAtividade::parse(parte) {
            Some(t) if !tipos.contains(&t) => tipos.push(t),
            Some(_) => {}
            None => invalidos.push(parte),
        }
    }
    if !invalidos.is_empty() {
        return Err(AppError::InvalidParam {
            code: "invalid_types",
            message: format!("Tipos inválidos: {}", invalidos.join(", ")),
        });
    }
    Ok(tipos)
}

pub fn parse_limite_atividades(raw: &Option<String>) -> AppResult<i64> {
    let Some(raw) = nao_vazio(raw) else {
        return Ok(LIMITE_ATIVIDADES_PADRAO);
    };
    raw.parse::<i64>()
        .ok()
        .filter(|l| (1..=LIMITE_ATIVIDADES_MAXIMO).contains(l))
        .ok_or_else(|| AppError::InvalidParam {
            code: "invalid_limit",
            message: "Limit deve estar entre 1 e 100.".into(),
        })
}

pub async fn activities(db_pool: &SqlitePool, query: &AtividadesQuery, periodo: Periodo) -> AppResult<AtividadesResponse> {
    let limit = parse_limite_atividades(&query.limit)?;
    let offset = nao_vazio(&query.offset)
        .and_then(|o| o.parse::<i64>().ok())
        .unwrap_or(0)
        .clamp(0, i64::MAX - LIMITE_ATIVIDADES_MAXIMO);
    let tipos = parse_tipos(&query.types)?;
    let (from, to) = limites(&periodo);

    // Cada fonte devolve no máximo offset + limit itens; o corte final é feito após a fusão
    let janela = offset.saturating_add(limit);
    let mut itens = Vec::new();
    let mut total = 0usize;
    for tipo in tipos {
        let f = fonte(tipo);
        let contagem = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {}{}", f.origem, f.filtro))
            .bind(from)
            .bind(to)
            .fetch_one(db_pool)
            .await?;
        total += contagem as usize;

        let rows = sqlx::query_as::<_, AtividadeRow>(&format!(
            "SELECT {} {}{} ORDER BY {} LIMIT ?",
            f.colunas, f.origem, f.filtro, f.ordem
        ))
        .bind(from)
        .bind(to)
        .bind(janela)
        .fetch_all(db_pool)
        .await?;
        itens.extend(rows.into_iter().map(|r| para_atividade(tipo, r)));
    }

    itens.sort_by(|a, b| b.quando.cmp(&a.quando).then_with(|| b.id.cmp(&a.id)));
    let items: Vec<Atividade> = itens
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(limit as usize)
        .collect();

    tracing::debug!("{} atividades devolvidas (total {})", items.len(), total);
    Ok(AtividadesResponse {
        items,
        total,
        limit,
        offset,
        period: periodo.into(),
    })
}

// --- Séries temporais ---

pub fn parse_serie(query: &SerieQuery) -> AppResult<(Metrica, Agrupamento)> {
    let metrica = match nao_vazio(&query.metric) {
        Some("uploads") => Metrica::Uploads,
        Some("registrations") => Metrica::Registrations,
        Some(_) => {
            return Err(AppError::InvalidParam {
                code: "invalid_metric",
                message: "Métrica inválida. Use 'uploads' ou 'registrations'.".into(),
            })
        }
        None => {
            return Err(AppError::InvalidParam {
                code: "invalid_metric",
                message: "Parâmetro 'metric' é obrigatório.".into(),
            })
        }
    };
    let agrupamento = match nao_vazio(&query.group_by).unwrap_or("day") {
        "day" => Agrupamento::Day,
        "week" => Agrupamento::Week,
        "month" => Agrupamento::Month,
        _ => {
            return Err(AppError::InvalidParam {
                code: "invalid_groupBy",
                message: "GroupBy inválido. Use 'day', 'week' ou 'month'.".into(),
            })
        }
    };
    Ok((metrica, agrupamento))
}

pub async fn timeseries(
    db_pool: &SqlitePool,
    metrica: Metrica,
    agrupamento: Agrupamento,
    periodo: Periodo,
) -> AppResult<SerieResponse> {
    let sql = match metrica {
        Metrica::Uploads => {
            r#"
            SELECT strftime(?, c.created_at) AS date, COUNT(*) AS value
            FROM imagens i
            JOIN colaboracoes c ON c.colaboracao_id = i.colaboracao_id
            WHERE c.created_at BETWEEN ? AND ?
            GROUP BY date
            ORDER BY date ASC
            "#
        }
        Metrica::Registrations => {
            r#"
            SELECT strftime(?, created_at) AS date, COUNT(*) AS value
            FROM users
            WHERE created_at BETWEEN ? AND ?
            GROUP BY date
            ORDER BY date ASC
            "#
        }
    };
    let (from, to) = limites(&periodo);
    let points = sqlx::query_as::<_, PontoSerie>(sql)
        .bind(agrupamento.formato_sql())
        .bind(from)
        .bind(to)
        .fetch_all(db_pool)
        .await?;

    Ok(SerieResponse {
        metric: metrica.as_str(),
        group_by: agrupamento.as_str(),
        points,
        period: periodo.into(),
    })
}

// --- Distribuições ---

async fn top_por_coluna(
    db_pool: &SqlitePool,
    coluna: &str,
    periodo: &Periodo,
    limit: i64,
) -> AppResult<Vec<Contagem>> {
    let (from, to) = limites(periodo);
    let rows = sqlx::query_as::<_, Contagem>(&format!(
        r#"
        SELECT {coluna} AS name, COUNT(*) AS count
        FROM colaboracoes
        WHERE created_at BETWEEN ? AND ?
        GROUP BY {coluna}
        ORDER BY count DESC, name ASC
        LIMIT ?
        "#
    ))
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

pub async fn distribution(
    db_pool: &SqlitePool,
    limit_raw: &Option<String>,
    periodo: Periodo,
) -> AppResult<DistribuicaoResponse> {
    let limit = limite_com_teto(limit_raw, 10, 100);
    Ok(DistribuicaoResponse {
        species: top_por_coluna(db_pool, "nome_especie", &periodo, limit).await?,
        countries: top_por_coluna(db_pool, "pais", &periodo, limit).await?,
        states: top_por_coluna(db_pool, "estado", &periodo, limit).await?,
        period: periodo.into(),
    })
}

/// Top N de colaborações aprovadas por espécie, região ou município, mais o resto agregado.
pub async fn distribution_top(
    db_pool: &SqlitePool,
    dimensao: Dimensao,
    limit_raw: &Option<String>,
    periodo: Periodo,
) -> AppResult<TopResponse> {
    let limit = limite_com_teto(limit_raw, 5, 20) as usize;
    let (from, to) = limites(&periodo);

    let todas = sqlx::query_as::<_, Contagem>(&format!(
        r#"
        SELECT COALESCE(NULLIF(TRIM({col}), ''), ?) AS name, COUNT(*) AS count
        FROM colaboracoes
        WHERE status = 'Aprovada' AND created_at BETWEEN ? AND ?
        GROUP BY name
        ORDER BY count DESC, name ASC
        "#,
        col = dimensao.coluna()
    ))
    .bind(dimensao.vazio())
    .bind(from)
    .bind(to)
    .fetch_all(db_pool)
    .await?;

    let total: i64 = todas.iter().map(|c| c.count).sum();
    let others: i64 = todas.iter().skip(limit).map(|c| c.count).sum();
    let chave = dimensao.chave();
    let top = todas
        .into_iter()
        .take(limit)
        .map(|c| json!({ chave: c.name, "count": c.count }))
        .collect();

    Ok(TopResponse {
        top,
        others,
        total,
        period: periodo.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_pool,
        models::{colaboracao::StatusColaboracao, imagem::StatusImagem},
        services::{colaboracao_service, imagem_service},
        test_support::{nova_colaboracao, seed_colaboracao, seed_user},
    };

    fn q(period: Option<&str>, from: Option<&str>, to: Option<&str>) -> PeriodoQuery {
        PeriodoQuery {
            period: period.map(Into::into),
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }

    fn agora() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn codigo(err: AppError) -> &'static str {
        match err {
            AppError::InvalidParam { code, .. } => code,
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn period_defaults_to_30_days() {
        let p = parse_periodo(&q(None, None, None), agora()).unwrap();
        assert_eq!(p.to - p.from, Duration::days(30));
        let p = parse_periodo(&q(Some("7d"), None, None), agora()).unwrap();
        assert_eq!(p.to - p.from, Duration::days(7));
    }

    #[test]
    fn period_all_starts_in_1900() {
        let p = parse_periodo(&q(Some("todo"), Some("2024-01-01"), Some("2023-01-01")), agora()).unwrap();
        assert_eq!(p.from.to_rfc3339(), "1900-01-01T00:00:00+00:00");
        assert_eq!(p.to, agora());
    }

    #[test]
    fn explicit_range_rules() {
        let p = parse_periodo(&q(None, Some("2024-01-01"), Some("2024-02-01T00:00:00Z")), agora()).unwrap();
        assert_eq!(p.to - p.from, Duration::days(31));

        let invertido = parse_periodo(&q(None, Some("2024-02-01"), Some("2024-01-01")), agora());
        assert_eq!(codigo(invertido.unwrap_err()), "invalid_date_range");
        let longo = parse_periodo(&q(None, Some("2022-01-01"), Some("2024-01-01")), agora());
        assert_eq!(codigo(longo.unwrap_err()), "invalid_date_range");
        let lixo = parse_periodo(&q(None, Some("ontem"), Some("hoje")), agora());
        assert_eq!(codigo(lixo.unwrap_err()), "invalid_date_range");
    }

    #[test]
    fn unknown_period_is_rejected() {
        let err = parse_periodo(&q(Some("15d"), None, None), agora()).unwrap_err();
        assert_eq!(codigo(err), "invalid_period");
    }

    #[test]
    fn activity_params() {
        assert_eq!(parse_limite_atividades(&None).unwrap(), 20);
        assert_eq!(codigo(parse_limite_atividades(&Some("0".into())).unwrap_err()), "invalid_limit");
        assert_eq!(codigo(parse_limite_atividades(&Some("101".into())).unwrap_err()), "invalid_limit");

        let tipos = parse_tipos(&Some("image_upload,user_registration".into())).unwrap();
        assert_eq!(tipos, vec![TipoAtividade::ImageUpload, TipoAtividade::UserRegistration]);
        assert_eq!(parse_tipos(&None).unwrap().len(), 5);
        assert_eq!(codigo(parse_tipos(&Some("image_upload,login".into())).unwrap_err()), "invalid_types");
    }

    #[test]
    fn series_params() {
        let serie = |metric: Option<&str>, group_by: Option<&str>| SerieQuery {
            periodo: PeriodoQuery::default(),
            metric: metric.map(Into::into),
            group_by: group_by.map(Into::into),
        };
        assert_eq!(
            parse_serie(&serie(Some("uploads"), None)).unwrap(),
            (Metrica::Uploads, Agrupamento::Day)
        );
        assert_eq!(codigo(parse_serie(&serie(None, None)).unwrap_err()), "invalid_metric");
        assert_eq!(codigo(parse_serie(&serie(Some("views"), None)).unwrap_err()), "invalid_metric");
        assert_eq!(
            codigo(parse_serie(&serie(Some("registrations"), Some("year"))).unwrap_err()),
            "invalid_groupBy"
        );
    }

    fn tudo() -> Periodo {
        parse_periodo(&q(Some("all"), None, None), Utc::now() + Duration::minutes(1)).unwrap()
    }

    #[tokio::test]
    async fn summary_counts() {
        let pool = test_pool().await;
        seed_user(&pool, "admin@x.com").await;
        let autor = seed_user(&pool, "a@x.com").await;
        let c = seed_colaboracao(&pool, autor.user_id, "Apis mellifera").await;
        seed_colaboracao(&pool, autor.user_id, "Apis mellifera").await;
        let img = imagem_service::insert(&pool, c.colaboracao_id, "1A", "https://h/a.jpg", "").await.unwrap();
        imagem_service::insert(&pool, c.colaboracao_id, "1B", "https://h/b.jpg", "").await.unwrap();
        imagem_service::update_status(&pool, img.imagem_id, StatusImagem::Aprovada).await.unwrap();

        let s = summary(&pool, tudo()).await.unwrap();
        assert_eq!(s.total_users, 2);
        assert_eq!(s.total_images, 2);
        assert_eq!(s.pending_collaborations, 2);
        assert_eq!(s.pending_images, 1);
        assert_eq!(s.new_users_this_period, 2);
        assert_eq!(s.new_images_this_period, 2);
        assert_eq!(s.users_by_type, UsersByType { common: 1, collaborator: 0, admin: 1 });

        let passado = parse_periodo(&q(None, Some("2020-01-01"), Some("2020-06-01")), agora()).unwrap();
        let s = summary(&pool, passado).await.unwrap();
        assert_eq!(s.new_users_this_period, 0);
    }

    #[tokio::test]
    async fn activities_merge_and_paginate() {
        let pool = test_pool().await;
        let autor = seed_user(&pool, "a@x.com").await;
        let c = seed_colaboracao(&pool, autor.user_id, "Apis mellifera").await;
        let img = imagem_service::insert(&pool, c.colaboracao_id, "1A", "https://h/a.jpg", "").await.unwrap();
        imagem_service::update_status(&pool, img.imagem_id, StatusImagem::Reprovada).await.unwrap();

        let query = AtividadesQuery::default();
        let r = activities(&pool, &query, tudo()).await.unwrap();
        // registo + colaboração + upload + reprovação
        assert_eq!(r.total, 4);
        assert_eq!(r.items.len(), 4);
        assert!(r.items.iter().any(|a| a.id == format!("img_{}_rejected", img.imagem_id)));
        assert!(r.items.windows(2).all(|w| w[0].quando >= w[1].quando));

        let query = AtividadesQuery {
            limit: Some("1".into()),
            offset: Some("1".into()),
            types: Some("collaboration_submitted,user_registration".into()),
            ..Default::default()
        };
        let r = activities(&pool, &query, tudo()).await.unwrap();
        assert_eq!(r.total, 2);
        assert_eq!(r.items.len(), 1);
        assert_eq!(r.items[0].tipo, "user_registration");

        let query = AtividadesQuery {
            offset: Some("9223372036854775807".into()),
            ..Default::default()
        };
        let r = activities(&pool, &query, tudo()).await.unwrap();
        assert_eq!(r.total, 4);
        assert!(r.items.is_empty());
    }

    #[tokio::test]
    async fn series_group_by_month() {
        let pool = test_pool().await;
        seed_user(&pool, "a@x.com").await;
        seed_user(&pool, "b@x.com").await;

        let r = timeseries(&pool, Metrica::Registrations, Agrupamento::Month, tudo()).await.unwrap();
        assert_eq!(r.points.len(), 1);
        assert_eq!(r.points[0].value, 2);
        assert_eq!(r.points[0].date, Utc::now().format("%Y-%m").to_string());
    }

    #[tokio::test]
    async fn top_distribution_groups_blank_and_others() {
        let pool = test_pool().await;
        let autor = seed_user(&pool, "a@x.com").await;
        for (especie, municipio) in [("Apis", "Goiânia"), ("Apis", "Goiânia"), ("Melipona", " "), ("Trigona", "Anápolis")] {
            let mut payload = nova_colaboracao(especie);
            payload.municipio = municipio.into();
            let c = colaboracao_service::create(&pool, autor.user_id, &payload).await.unwrap();
            colaboracao_service::update_status(&pool, c.colaboracao_id, StatusColaboracao::Aprovada)
                .await
                .unwrap();
        }
        // Em análise não entra
        seed_colaboracao(&pool, autor.user_id, "Apis").await;

        let r = distribution_top(&pool, Dimensao::Municipio, &Some("2".into()), tudo()).await.unwrap();
        assert_eq!(r.total, 4);
        assert_eq!(r.top[0]["city"], "Goiânia");
        assert_eq!(r.top[0]["count"], 2);
        assert_eq!(r.others, 1);

        let r = distribution(&pool, &None, tudo()).await.unwrap();
        assert_eq!(r.species[0], Contagem { name: "Apis".into(), count: 3 });
        assert_eq!(r.countries[0].count, 5);
    }
}
