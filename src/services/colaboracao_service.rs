// src/services/colaboracao_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        colaboracao::{
            AtualizarColaboracao, Colaboracao, ColaboracaoComImagens, ColaboracaoDetalhe,
            ColaboracaoDto, ColaboracaoRow, FiltrosColaboracao, NovaColaboracao, StatusColaboracao,
        },
        datas,
    },
    services::{
        coordenadas::{self, Eixo},
        image_host::ImageHost,
        imagem_service, user_service,
    },
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT_COM_AUTOR: &str = r#"
    SELECT c.*, u.nome_completo AS autor_nome
    FROM colaboracoes c
    LEFT JOIN users u ON u.user_id = c.user_id
"#;

fn nao_encontrada() -> AppError {
    AppError::NotFound("Colaboração não encontrada.".into())
}

fn vazio_para_none(valor: Option<&str>) -> Option<&str> {
    valor.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn create(
    db_pool: &SqlitePool,
    user_id: i64,
    payload: &NovaColaboracao,
) -> AppResult<Colaboracao> {
    if user_service::find_user_by_id(db_pool, user_id).await?.is_none() {
        return Err(AppError::NotFound("Usuário não encontrado.".into()));
    }

    let latitude = coordenadas::normalizar(&payload.latitude, Eixo::Latitude)?;
    let longitude = coordenadas::normalizar(&payload.longitude, Eixo::Longitude)?;
    let altitude = payload.altitude.clone().into_texto();
    let agora = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO colaboracoes (
            user_id, nome_especie, data, pais, regiao, estado, municipio,
            latitude, longitude, altitude, coletor, instituicao_coletor,
            autor_foto, instituicao_autor, SISBIO, SISGEN, observacoes,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(payload.nome_especie.trim())
    .bind(payload.data)
    .bind(payload.pais.trim())
    .bind(payload.regiao.trim())
    .bind(payload.estado.trim())
    .bind(payload.municipio.trim())
    .bind(&latitude)
    .bind(&longitude)
    .bind(&altitude)
    .bind(payload.coletor.trim())
    .bind(payload.instituicao_coletor.trim())
    .bind(payload.autor_foto.trim())
    .bind(payload.instituicao_autor.trim())
    .bind(vazio_para_none(payload.sisbio.as_deref()))
    .bind(vazio_para_none(payload.sisgen.as_deref()))
    .bind(payload.observacoes.as_deref())
    .bind(agora)
    .bind(agora)
    .execute(db_pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!("Colaboração {} criada pelo utilizador {}", id, user_id);
    find_by_id(db_pool, id).await?.ok_or(AppError::InternalServerError)
}

pub async fn find_by_id(db_pool: &SqlitePool, colaboracao_id: i64) -> AppResult<Option<Colaboracao>> {
    let colaboracao =
        sqlx::query_as::<_, Colaboracao>("SELECT * FROM colaboracoes WHERE colaboracao_id = ?")
            .bind(colaboracao_id)
            .fetch_optional(db_pool)
            .await?;
    Ok(colaboracao)
}

pub async fn find_detalhe(db_pool: &SqlitePool, colaboracao_id: i64) -> AppResult<ColaboracaoDetalhe> {
    tracing::debug!("Buscando colaboração {}", colaboracao_id);
    let row = sqlx::query_as::<_, ColaboracaoRow>(&format!(
        "{} WHERE c.colaboracao_id = ?",
        SELECT_COM_AUTOR
    ))
    .bind(colaboracao_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(nao_encontrada)?;
    Ok(row.into())
}

/// Listagem reduzida, opcionalmente só de um utilizador.
pub async fn list(db_pool: &SqlitePool, user_id: Option<i64>) -> AppResult<Vec<ColaboracaoDto>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COM_AUTOR);
    if let Some(user_id) = user_id {
        qb.push(" WHERE c.user_id = ").push_bind(user_id);
    }
    qb.push(" ORDER BY c.colaboracao_id ASC");

    let rows = qb.build_query_as::<ColaboracaoRow>().fetch_all(db_pool).await?;
    tracing::debug!("{} colaborações listadas", rows.len());
    Ok(rows.into_iter().map(ColaboracaoDto::from).collect())
}

pub async fn find_by_especie(db_pool: &SqlitePool, nome_especie: &str) -> AppResult<Vec<Colaboracao>> {
    let colaboracoes = sqlx::query_as::<_, Colaboracao>(
        "SELECT * FROM colaboracoes WHERE nome_especie = ? ORDER BY colaboracao_id ASC",
    )
    .bind(nome_especie.trim())
    .fetch_all(db_pool)
    .await?;
    Ok(colaboracoes)
}

pub async fn find_by_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<ColaboracaoDetalhe>> {
    let rows = sqlx::query_as::<_, ColaboracaoRow>(&format!(
        "{} WHERE c.user_id = ? ORDER BY c.colaboracao_id ASC",
        SELECT_COM_AUTOR
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows.into_iter().map(ColaboracaoDetalhe::from).collect())
}

/// Atualização parcial. Quem chama decide se `status` pode ser alterado.
pub async fn update(
    db_pool: &SqlitePool,
    colaboracao_id: i64,
    payload: &AtualizarColaboracao,
) -> AppResult<ColaboracaoDetalhe> {
    let latitude = payload
        .latitude
        .as_ref()
        .map(|v| coordenadas::normalizar(v, Eixo::Latitude))
        .transpose()?;
    let longitude = payload
        .longitude
        .as_ref()
        .map(|v| coordenadas::normalizar(v, Eixo::Longitude))
        .transpose()?;
    let altitude = payload.altitude.clone().map(|a| a.into_texto());

    let result = sqlx::query(
        r#"
        UPDATE colaboracoes SET
            nome_especie = COALESCE(?, nome_especie),
            data = COALESCE(?, data),
            pais = COALESCE(?, pais),
            regiao = COALESCE(?, regiao),
            estado = COALESCE(?, estado),
            municipio = COALESCE(?, municipio),
            latitude = COALESCE(?, latitude),
            longitude = COALESCE(?, longitude),
            altitude = COALESCE(?, altitude),
            coletor = COALESCE(?, coletor),
            instituicao_coletor = COALESCE(?, instituicao_coletor),
            autor_foto = COALESCE(?, autor_foto),
            instituicao_autor = COALESCE(?, instituicao_autor),
            SISBIO = CASE WHEN ? IS NULL THEN SISBIO ELSE NULLIF(TRIM(?), '') END,
            SISGEN = CASE WHEN ? IS NULL THEN SISGEN ELSE NULLIF(TRIM(?), '') END,
            observacoes = COALESCE(?, observacoes),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE colaboracao_id = ?
        "#,
    )
    .bind(payload.nome_especie.as_deref().map(str::trim))
    .bind(payload.data)
    .bind(payload.pais.as_deref().map(str::trim))
    .bind(payload.regiao.as_deref().map(str::trim))
    .bind(payload.estado.as_deref().map(str::trim))
    .bind(payload.municipio.as_deref().map(str::trim))
    .bind(latitude)
    .bind(longitude)
    .bind(altitude)
    .bind(payload.coletor.as_deref().map(str::trim))
    .bind(payload.instituicao_coletor.as_deref().map(str::trim))
    .bind(payload.autor_foto.as_deref().map(str::trim))
    .bind(payload.instituicao_autor.as_deref().map(str::trim))
    // Texto vazio em SISBIO/SISGEN limpa o campo; ausente mantém
    .bind(payload.sisbio.as_deref())
    .bind(payload.sisbio.as_deref())
    .bind(payload.sisgen.as_deref())
    .bind(payload.sisgen.as_deref())
    .bind(payload.observacoes.as_deref())
    .bind(payload.status)
    .bind(Utc::now().naive_utc())
    .bind(colaboracao_id)
    .execute(db_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(nao_encontrada());
    }
    tracing::info!("Colaboração {} atualizada", colaboracao_id);

    let detalhe = find_detalhe(db_pool, colaboracao_id).await?;
    if payload.status == Some(StatusColaboracao::Aprovada) {
        user_service::promote_if_comum(db_pool, detalhe.colaboracao.user_id).await?;
    }
    Ok(detalhe)
}

/// Revisão de status. Aprovar promove o autor `Comum` a `Colaborador`.
pub async fn update_status(
    db_pool: &SqlitePool,
    colaboracao_id: i64,
    status: StatusColaboracao,
) -> AppResult<ColaboracaoDetalhe> {
    let result = sqlx::query("UPDATE colaboracoes SET status = ?, updated_at = ? WHERE colaboracao_id = ?")
        .bind(status)
        .bind(Utc::now().naive_utc())
        .bind(colaboracao_id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(nao_encontrada());
    }
    tracing::info!("Colaboração {} marcada como '{}'", colaboracao_id, status.as_str());

    let detalhe = find_detalhe(db_pool, colaboracao_id).await?;
    if status == StatusColaboracao::Aprovada {
        user_service::promote_if_comum(db_pool, detalhe.colaboracao.user_id).await?;
    }
    Ok(detalhe)
}

/// Remove os ficheiros hospedados e apaga a colaboração (imagens e comentários em cascata).
pub async fn delete(db_pool: &SqlitePool, host: &dyn ImageHost, colaboracao_id: i64) -> AppResult<()> {
    if find_by_id(db_pool, colaboracao_id).await?.is_none() {
        return Err(nao_encontrada());
    }

    let urls: Vec<String> = imagem_service::find_by_colaboracao(db_pool, colaboracao_id)
        .await?
        .into_iter()
        .map(|i| i.url_imagem)
        .collect();
    imagem_service::destroy_hosted(host, &urls).await;

    sqlx::query("DELETE FROM colaboracoes WHERE colaboracao_id = ?")
        .bind(colaboracao_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Colaboração {} removida ({} imagens)", colaboracao_id, urls.len());
    Ok(())
}

/// Filtros por igualdade e intervalo de datas; o status padrão é `Aprovada`.
pub async fn filtrar(
    db_pool: &SqlitePool,
    filtros: &FiltrosColaboracao,
) -> AppResult<Vec<ColaboracaoComImagens>> {
    let status = filtros.status.unwrap_or(StatusColaboracao::Aprovada);
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM colaboracoes WHERE status = ");
    qb.push_bind(status);

    for (coluna, valor) in [
        ("nome_especie", &filtros.nome_especie),
        ("pais", &filtros.pais),
        ("regiao", &filtros.regiao),
        ("estado", &filtros.estado),
        ("municipio", &filtros.municipio),
    ] {
        if let Some(valor) = vazio_para_none(valor.as_deref()) {
            qb.push(format!(" AND {} = ", coluna)).push_bind(valor.to_string());
        }
    }

    if let Some(raw) = vazio_para_none(filtros.min_date.as_deref()) {
        let min = datas::parse_data_flexivel(raw)
            .ok_or_else(|| AppError::BadRequest(format!("minDate inválida: '{}'", raw)))?;
        qb.push(" AND data >= ").push_bind(min);
    }
    if let Some(raw) = vazio_para_none(filtros.max_date.as_deref()) {
        let max = datas::parse_fim_do_dia(raw)
            .ok_or_else(|| AppError::BadRequest(format!("maxDate inválida: '{}'", raw)))?;
        qb.push(" AND data <= ").push_bind(max);
    }
    qb.push(" ORDER BY data ASC, colaboracao_id ASC");

    let colaboracoes = qb.build_query_as::<Colaboracao>().fetch_all(db_pool).await?;
    let ids: Vec<i64> = colaboracoes.iter().map(|c| c.colaboracao_id).collect();
    let mut imagens = imagem_service::find_by_colaboracoes(db_pool, &ids, false).await?;

    tracing::debug!("Filtro de colaborações devolveu {} resultados", colaboracoes.len());
    Ok(colaboracoes
        .into_iter()
        .map(|c| ColaboracaoComImagens {
            imagens: imagens.remove(&c.colaboracao_id).unwrap_or_default(),
            colaboracao: c,
        })
        .collect())
}
