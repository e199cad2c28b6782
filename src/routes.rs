//! The HTTP endpoints. Handlers only extract, call into the modules and
//! render; failures travel as [`AppError`].
use crate::auth::{self, LoginRequest, LoginResponse};
use crate::catalog;
use crate::error::AppError;
use crate::ids::{AlunoId, OrigemId};
use crate::questionnaire::{self, schema::RespostasQuery, schema::SubmissaoRequest};
use crate::schema::{Aluno, CadastroForm};
use crate::search::{self, search_schema::BuscaRequest};
use crate::students;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use egresso_derive::ensure_session;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursosQuery {
    pub origem_id: Option<OrigemId>,
}

#[derive(Debug, Deserialize)]
pub struct CepQuery {
    #[serde(default)]
    pub cep: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuariosQuery {
    pub aluno_id: Option<AlunoId>,
}

#[derive(Debug, Serialize)]
pub struct CadastroConcluido {
    pub success: bool,
    pub token: String,
    pub aluno: Aluno,
}

fn aluno_id(raw: &str) -> Result<AlunoId, AppError> {
    raw.parse().map_err(|_| AppError::BadRequest {
        message: format!("Identificador de aluno inválido: {}", raw),
    })
}

pub async fn get_origens(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(catalog::list_origens(&data.db).await?))
}

pub async fn get_cursos(
    data: web::Data<AppState>,
    query: web::Query<CursosQuery>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(catalog::list_cursos(&data.db, query.origem_id).await?))
}

pub async fn get_semestres() -> HttpResponse {
    HttpResponse::Ok().json(catalog::list_semestres())
}

pub async fn get_endereco(
    data: web::Data<AppState>,
    query: web::Query<CepQuery>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(catalog::find_endereco(&data.db, &query.cep).await?))
}

pub async fn get_alunos(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(students::list_alunos(&data.db).await?))
}

pub async fn post_aluno(
    data: web::Data<AppState>,
    form: web::Json<CadastroForm>,
) -> Result<HttpResponse, AppError> {
    let aluno = students::create_aluno(&data.db, &form).await?;
    Ok(HttpResponse::Created().json(aluno))
}

pub async fn get_aluno(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = aluno_id(&path)?;
    Ok(HttpResponse::Ok().json(students::get_aluno(&data.db, id).await?))
}

pub async fn put_aluno(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<CadastroForm>,
) -> Result<HttpResponse, AppError> {
    let id = aluno_id(&path)?;
    Ok(HttpResponse::Ok().json(students::update_aluno(&data.db, id, &form).await?))
}

pub async fn busca(
    data: web::Data<AppState>,
    body: web::Json<BuscaRequest>,
) -> Result<HttpResponse, AppError> {
    let term = body.into_inner().into_term()?;
    let outcome = search::lookup(&data.db, &term).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn get_cadastro(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = aluno_id(&path)?;
    Ok(HttpResponse::Ok().json(students::cadastro_prefill(&data.db, id).await?))
}

pub async fn post_cadastro(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<CadastroForm>,
) -> Result<HttpResponse, AppError> {
    let id = aluno_id(&path)?;
    let (aluno, session) = students::complete_registration(&data, id, &form).await?;
    Ok(HttpResponse::Ok().json(CadastroConcluido {
        success: true,
        token: session.token,
        aluno,
    }))
}

/// json-server style: a list with the account of the student, or an empty one.
pub async fn get_usuarios(
    data: web::Data<AppState>,
    query: web::Query<UsuariosQuery>,
) -> Result<HttpResponse, AppError> {
    let aluno_id = query.aluno_id.ok_or_else(|| AppError::BadRequest {
        message: "Informe o alunoId.".to_string(),
    })?;
    let user = auth::find_user_by_aluno(&data.db, aluno_id).await?;
    Ok(HttpResponse::Ok().json(user.into_iter().collect::<Vec<_>>()))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    match auth::login(&data, &body).await {
        Ok(session) => Ok(HttpResponse::Ok().json(LoginResponse::ok(session.token))),
        Err(AppError::Unauthorized { message, .. }) => {
            Ok(HttpResponse::Unauthorized().json(LoginResponse::failed(message)))
        }
        Err(e) => Err(e),
    }
}

#[ensure_session]
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    auth::logout(data.sessions.as_ref(), &session.token).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Sessão encerrada."})))
}

#[ensure_session]
pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(session))
}

pub async fn get_questionario(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(questionnaire::get_questionario(&data.db).await?))
}

#[ensure_session]
pub async fn post_respostas(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<SubmissaoRequest>,
) -> Result<HttpResponse, AppError> {
    let saved = questionnaire::salvar_resposta(&data.db, &session, body.into_inner().respostas).await?;
    Ok(HttpResponse::Created().json(saved))
}

#[ensure_session]
pub async fn get_respostas(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<RespostasQuery>,
) -> Result<HttpResponse, AppError> {
    let respostas = questionnaire::respostas_por_aluno(&data.db, &session, query.aluno_id).await?;
    Ok(HttpResponse::Ok().json(respostas))
}

#[ensure_session]
pub async fn get_resposta(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(questionnaire::resposta_por_id(&data.db, &session, &path).await?))
}

/// Registers every endpoint. Malformed bodies and queries answer with the
/// same JSON error shape as everything else.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        AppError::BadRequest { message: err.to_string() }.into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        AppError::BadRequest { message: err.to_string() }.into()
    }))
    .route("/origens", web::get().to(get_origens))
    .route("/cursos", web::get().to(get_cursos))
    .route("/semestres", web::get().to(get_semestres))
    .route("/enderecos", web::get().to(get_endereco))
    .route("/alunos/busca", web::post().to(busca))
    .service(
        web::resource("/alunos")
            .route(web::get().to(get_alunos))
            .route(web::post().to(post_aluno)),
    )
    .service(
        web::resource("/alunos/{id}")
            .route(web::get().to(get_aluno))
            .route(web::put().to(put_aluno)),
    )
    .service(
        web::resource("/alunos/{id}/cadastro")
            .route(web::get().to(get_cadastro))
            .route(web::post().to(post_cadastro)),
    )
    .route("/usuarios", web::get().to(get_usuarios))
    .route("/auth/login", web::post().to(login))
    .route("/auth/logout", web::post().to(logout))
    .route("/auth/me", web::get().to(me))
    .route("/questionario", web::get().to(get_questionario))
    .service(
        web::resource("/questionario-respostas")
            .route(web::get().to(get_respostas))
            .route(web::post().to(post_respostas)),
    )
    .route("/questionario-respostas/{id}", web::get().to(get_resposta));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::validation::tests::filled_form;
    use crate::tests::seeded_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data(web::Data::new($state)).configure(configure)).await
        };
    }

    #[actix_rt::test]
    async fn catalog_endpoints() {
        let app = app!(seeded_state().await);

        let req = test::TestRequest::get().uri("/cursos?origemId=2").to_request();
        let cursos: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cursos, json!([{"id": 201, "nome": "Especialização em Engenharia de Dados", "origemId": 2}]));

        let req = test::TestRequest::get().uri("/semestres").to_request();
        let semestres: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(semestres[1]["id"], "2");

        let req = test::TestRequest::get().uri("/enderecos?cep=30140-071").to_request();
        let endereco: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(endereco["cidade"], "Belo Horizonte");

        let req = test::TestRequest::get().uri("/enderecos?cep=99999999").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/enderecos?cep=123").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["errors"], json!({"cep": "pattern"}));
    }

    #[actix_rt::test]
    async fn bad_ids_and_bodies() {
        let app = app!(seeded_state().await);

        let req = test::TestRequest::get().uri("/alunos/abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/alunos/999").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/alunos/busca")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert!(body["message"].is_string());
    }

    #[actix_rt::test]
    async fn login_failure_shape() {
        let app = app!(seeded_state().await);
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"nome": "Maria Aparecida Souza", "dataNascimento": "01/01/1972", "cursoId": 101}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"success": false, "message": "Credenciais inválidas"}));
    }

    #[actix_rt::test]
    async fn protected_endpoints_redirect_to_login() {
        let app = app!(seeded_state().await);
        let req = test::TestRequest::get().uri("/auth/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["redirect"], "/login?returnUrl=%2Fauth%2Fme");
    }

    #[actix_rt::test]
    async fn search_register_answer() {
        let app = app!(seeded_state().await);

        let req = test::TestRequest::post()
            .uri("/alunos/busca")
            .set_json(json!({"nome": "joão", "dataNascimento": "03/07/1985", "origemId": "1", "cursoId": "102"}))
            .to_request();
        let outcome: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(outcome["resultado"], "cadastro");
        assert_eq!(outcome["prefill"]["alunoId"], 2);

        let req = test::TestRequest::post()
            .uri("/alunos/2/cadastro")
            .set_json(filled_form())
            .to_request();
        let done: Value = test::call_and_read_body_json(&app, req).await;
        let token = done["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri("/usuarios?alunoId=2").to_request();
        let usuarios: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(usuarios.as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/questionario-respostas")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({"respostas": [
                {"questaoId": 1, "opcaoId": "1a"},
                {"questaoId": 2, "multiplas": [{"opcaoId": "2c", "textoAdicional": "Mestrado"}]}
            ]}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let saved: Value = test::read_body_json(res).await;
        assert_eq!(saved["alunoId"], 2);

        let req = test::TestRequest::get()
            .uri("/questionario-respostas")
            .insert_header(("Authorization", token.clone()))
            .to_request();
        let respostas: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(respostas.as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(("Authorization", token.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn login_then_me() {
        let app = app!(seeded_state().await);
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({
                "nome": "carlos eduardo ramos", "numeroAcademico": "20180001",
                "dataNascimento": "29/02/2000", "cursoId": "103", "turnoId": "noite"
            }))
            .to_request();
        let login: LoginResponse = test::call_and_read_body_json(&app, req).await;
        assert!(login.success);

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", login.token.unwrap()))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["alunoId"], 4);
    }
}
