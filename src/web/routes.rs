// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, colaboracao_handlers, comentario_handlers, dashboard_handlers,
        imagem_handlers, mw_admin, mw_auth, search_handlers, user_handlers,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/health", get(search_handlers::handle_health))
        .route("/register", post(auth_handlers::handle_register))
        .route("/login", post(auth_handlers::handle_login))
        .route("/request-password-reset", post(auth_handlers::handle_request_password_reset))
        .route("/reset-password", post(auth_handlers::handle_reset_password))
        .route("/verify-email", get(auth_handlers::handle_verify_email))
        .route("/users", post(user_handlers::handle_create_user))
        .route("/api/search/colaboracoes", get(search_handlers::handle_search));

    // --- Painel --- (montado sob /admin/dashboard)
    let dashboard_routes = Router::new()
        .route("/summary", get(dashboard_handlers::handle_summary))
        .route("/activities", get(dashboard_handlers::handle_activities))
        .route("/timeseries", get(dashboard_handlers::handle_timeseries))
        .route("/distribution", get(dashboard_handlers::handle_distribution))
        .route("/distribution/species", get(dashboard_handlers::handle_top_species))
        .route("/distribution/regions", get(dashboard_handlers::handle_top_regions))
        .route("/distribution/cities", get(dashboard_handlers::handle_top_cities));

    // --- Rotas de Admin ---
    // mw_auth é aplicado no router pai, mw_admin só aqui
    let admin_routes = Router::new()
        .route("/users/{id}/tipo", put(user_handlers::handle_update_tipo))
        .route("/colaboracoes/{id}/status", put(colaboracao_handlers::handle_update_status))
        .route("/imagens/status/{id}", put(imagem_handlers::handle_update_status))
        .nest("/admin/dashboard", dashboard_routes)
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        // Utilizadores
        .route("/users", get(user_handlers::handle_list_users))
        .route("/users/{id}", get(user_handlers::handle_get_user))
        .route("/user/email", get(user_handlers::handle_get_user_by_email))
        .route("/users_update/{id}", put(user_handlers::handle_update_user))
        .route("/users/{id}/senha", put(user_handlers::handle_update_senha))
        .route("/user_delete/{id}", axum::routing::delete(user_handlers::handle_delete_user))
        // Colaborações ({id} é o user_id no POST)
        .route("/colaboracoes", get(colaboracao_handlers::handle_list))
        .route(
            "/colaboracoes/{id}",
            get(colaboracao_handlers::handle_get)
                .post(colaboracao_handlers::handle_create)
                .put(colaboracao_handlers::handle_update)
                .delete(colaboracao_handlers::handle_delete),
        )
        .route("/colaboracoes/especie/{nome}", get(colaboracao_handlers::handle_by_especie))
        .route("/colaboracoes/usuario/{id}", get(colaboracao_handlers::handle_by_usuario))
        .route("/colaboracoes-filtros", post(colaboracao_handlers::handle_filtros))
        // Comentários
        .route(
            "/colaboracoes/{id}/comentarios",
            get(comentario_handlers::handle_list).post(comentario_handlers::handle_create),
        )
        .route(
            "/comentarios/{id}",
            get(comentario_handlers::handle_get)
                .patch(comentario_handlers::handle_update)
                .delete(comentario_handlers::handle_delete),
        )
        // Imagens
        .route("/imagens", get(imagem_handlers::handle_list))
        .route(
            "/imagens/{id}",
            get(imagem_handlers::handle_get)
                .put(imagem_handlers::handle_update)
                .delete(imagem_handlers::handle_delete),
        )
        .route("/imagens/colaboracao/{id}", get(imagem_handlers::handle_by_colaboracao))
        .route("/imagens/codigo/{codigo}", get(imagem_handlers::handle_by_codigo))
        .route(
            "/imagens/{id}/upload",
            post(imagem_handlers::handle_upload)
                .layer(DefaultBodyLimit::max(imagem_handlers::LIMITE_UPLOAD)),
        )
        .merge(admin_routes)
        // require_auth corre antes de tudo o que foi definido ACIMA (incluindo admin)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
