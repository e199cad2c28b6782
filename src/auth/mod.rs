//! Here is all we need for authentication
//!
//! Students log in with the data they already know (name, birth date,
//! course). A successful login or a completed registration opens a
//! [`Session`]; its token travels in the `Authorization` header, with or
//! without a `Bearer ` prefix.
//!
//! Endpoints that need a session use the attribute macro:
//! ```ignore
//! #[ensure_session]
//! pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
//!     Ok(HttpResponse::Ok().json(session))
//! }
//! ```
//! Both `req` and `data` have to be named like that.

pub mod store;

pub use store::{MemorySessionStore, SessionError, SessionStore, SqliteSessionStore};

use crate::date;
use crate::error::{AppError, FieldErrors};
use crate::ids::{AlunoId, CursoId, UserId};
use crate::model;
use crate::schema::{non_empty, Aluno, Usuario};
use crate::AppState;
use actix_web::HttpRequest;
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha256::digest;
use sqlx::{SqliteConnection, SqlitePool};

pub const INVALID_CREDENTIALS: &str = "Credenciais inválidas";

/// The logged in student. Replaces any notion of a global current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub aluno_id: AlunoId,
    pub nome: String,
    pub created_at: i64,
    pub last_refresh: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub nome: String,
    pub numero_academico: Option<String>,
    pub data_nascimento: String,
    pub curso_id: Option<CursoId>,
    // sent by the login form, not needed to identify the account
    pub ano_ultima_matricula: Option<String>,
    pub semestre_ultima_matricula_id: Option<String>,
    pub turno_id: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub message: String,
}

impl LoginResponse {
    pub fn ok(token: String) -> Self {
        Self {
            success: true,
            token: Some(token),
            message: "Login bem-sucedido".to_string(),
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            success: false,
            token: None,
            message,
        }
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn user_model2schema(m: model::Usuario) -> Result<Usuario, AppError> {
    let data_nasc = date::parse_storage(&m.data_nasc).map_err(|e| {
        AppError::internal(format!("Stored birth date of usuario {} is unreadable", m.id), e)
    })?;
    Ok(Usuario {
        id: m.id,
        aluno_id: m.aluno_id,
        nome: m.nome,
        data_nasc,
        curso_id: m.curso_id,
        numero_academico: m.numero_academico,
    })
}

pub async fn find_user_by_aluno(db: &SqlitePool, aluno_id: AlunoId) -> Result<Option<Usuario>, AppError> {
    let row = sqlx::query_as::<_, model::Usuario>(
        "SELECT id, aluno_id, nome, data_nasc, curso_id, numero_academico FROM usuarios WHERE aluno_id = ?",
    )
    .bind(aluno_id)
    .fetch_optional(db)
    .await?;
    row.map(user_model2schema).transpose()
}

pub async fn has_account(db: &SqlitePool, aluno_id: AlunoId) -> Result<bool, AppError> {
    Ok(find_user_by_aluno(db, aluno_id).await?.is_some())
}

/// Returns the account of the student, creating it from the student record
/// when there is none yet.
pub async fn ensure_account(
    db: &SqlitePool,
    aluno: &Aluno,
    numero_academico: Option<&str>,
) -> Result<Usuario, AppError> {
    if let Some(user) = find_user_by_aluno(db, aluno.id).await? {
        return Ok(user);
    }

    {
        let mut con = db.acquire().await?;
        insert_account(
            &mut *con,
            aluno.id,
            &aluno.nome,
            aluno.data_nasc,
            aluno.curso_id,
            numero_academico,
        )
        .await?;
    }

    find_user_by_aluno(db, aluno.id)
        .await?
        .ok_or_else(|| AppError::internal("Newly inserted account is missing", aluno.id))
}

/// Writes the account row. Takes a connection so it can join the caller's
/// transaction.
pub async fn insert_account(
    con: &mut SqliteConnection,
    aluno_id: AlunoId,
    nome: &str,
    data_nasc: NaiveDate,
    curso_id: CursoId,
    numero_academico: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO usuarios(aluno_id, nome, data_nasc, curso_id, numero_academico) VALUES (?,?,?,?,?)",
    )
    .bind(aluno_id)
    .bind(nome)
    .bind(date::to_storage(data_nasc))
    .bind(curso_id)
    .bind(numero_academico)
    .execute(&mut *con)
    .await?;
    info!("Created account for aluno {}", aluno_id);
    Ok(())
}

/// Names compare trimmed and without regard to case; the academic number
/// only counts when it was given.
pub fn credentials_match(user: &Usuario, nome: &str, data_nasc: NaiveDate, numero: Option<&str>) -> bool {
    let same_name = user.nome.trim().to_lowercase() == nome.trim().to_lowercase();
    let same_numero = match numero {
        Some(n) => user.numero_academico.as_deref().map(str::trim) == Some(n),
        None => true,
    };
    same_name && user.data_nasc == data_nasc && same_numero
}

/// generate a random hash
fn gen_api_key() -> String {
    let mut bytes: [u8; 64] = [0; 64];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    let tmp: String = bytes.iter().map(|v| format!("{:02x}", v)).collect();
    digest(tmp)
}

/// Opens a new session for the account. Sessions idle past the TTL are
/// dropped first so the store does not grow without bound.
pub async fn open_session(state: &AppState, user: &Usuario) -> Result<Session, AppError> {
    let ts = now();
    let purged = state.sessions.purge(ts - state.session_ttl).await?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }
    let session = Session {
        token: gen_api_key(),
        user_id: user.id,
        aluno_id: user.aluno_id,
        nome: user.nome.clone(),
        created_at: ts,
        last_refresh: ts,
    };
    state.sessions.insert(&session).await?;
    debug!("Opened session for usuario {}", user.id);
    Ok(session)
}

pub async fn login(state: &AppState, request: &LoginRequest) -> Result<Session, AppError> {
    let mut errors = FieldErrors::new();

    let nome = request.nome.trim();
    if nome.is_empty() {
        errors.add("nome", "required");
    }
    let data_nasc = if request.data_nascimento.trim().is_empty() {
        errors.add("dataNascimento", "required");
        None
    } else {
        match date::parse_ui(request.data_nascimento.trim()) {
            Ok(d) => Some(d),
            Err(e) => {
                errors.add("dataNascimento", e.code());
                None
            }
        }
    };
    if request.curso_id.is_none() {
        errors.add("cursoId", "required");
    }
    errors.into_result("Formulário de login inválido")?;

    let (data_nasc, curso_id) = match (data_nasc, request.curso_id) {
        (Some(d), Some(c)) => (d, c),
        _ => return Err(AppError::BadRequest { message: "Formulário de login inválido".to_string() }),
    };

    let candidates = sqlx::query_as::<_, model::Usuario>(
        "SELECT id, aluno_id, nome, data_nasc, curso_id, numero_academico FROM usuarios WHERE curso_id = ?",
    )
    .bind(curso_id)
    .fetch_all(&state.db)
    .await?;

    let numero = non_empty(&request.numero_academico);
    for row in candidates {
        let user = user_model2schema(row)?;
        if credentials_match(&user, nome, data_nasc, numero) {
            info!("Login of usuario {}", user.id);
            return open_session(state, &user).await;
        }
    }

    Err(AppError::Unauthorized {
        message: INVALID_CREDENTIALS.to_string(),
        redirect: "/login".to_string(),
    })
}

pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let value = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn login_redirect(req: &HttpRequest) -> String {
    format!("/login?returnUrl={}", urlencoding::encode(req.path()))
}

/// Resolves the session of a request, refreshing it. Used by `#[ensure_session]`.
pub async fn require_session(req: &HttpRequest, state: &AppState) -> Result<Session, AppError> {
    let token = match token_from_request(req) {
        Some(t) => t,
        None => {
            return Err(AppError::Unauthorized {
                message: "Sessão não encontrada. Faça login.".to_string(),
                redirect: login_redirect(req),
            })
        }
    };

    let mut session = match state.sessions.get(&token).await? {
        Some(s) => s,
        None => {
            return Err(AppError::Unauthorized {
                message: "Sessão inválida. Faça login.".to_string(),
                redirect: login_redirect(req),
            })
        }
    };

    let ts = now();
    if ts - session.last_refresh > state.session_ttl {
        state.sessions.remove(&token).await?;
        return Err(AppError::Forbidden {
            message: "Sessão expirada. Faça login novamente.".to_string(),
        });
    }

    state.sessions.touch(&token, ts).await?;
    session.last_refresh = ts;
    Ok(session)
}

pub async fn logout(sessions: &dyn SessionStore, token: &str) -> Result<bool, AppError> {
    Ok(sessions.remove(token).await?)
}
