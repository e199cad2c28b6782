//! The survey students fill in after logging in.
pub mod schema;

use self::schema::{Questao, Questionario, QuestionarioResposta, Resposta, TipoQuestao};
use crate::auth::Session;
use crate::error::{AppError, FieldErrors};
use crate::ids::AlunoId;
use crate::model;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

const INVALID_ANSWERS: &str = "Responda todas as questões obrigatórias corretamente.";

fn questionario_model2schema(m: model::Questionario) -> Result<Questionario, AppError> {
    let questoes = serde_json::from_str(&m.questoes)
        .map_err(|e| AppError::internal(format!("Questions of {} are unreadable", m.id), e))?;
    Ok(Questionario {
        id: m.id,
        titulo: m.titulo,
        descricao: m.descricao,
        questoes,
    })
}

fn resposta_model2schema(m: model::QuestionarioResposta) -> Result<QuestionarioResposta, AppError> {
    let data_preenchimento = DateTime::parse_from_rfc3339(&m.data_preenchimento)
        .map_err(|e| AppError::internal(format!("Date of answer {} is unreadable", m.id), e))?
        .with_timezone(&Utc);
    let respostas = serde_json::from_str(&m.respostas)
        .map_err(|e| AppError::internal(format!("Answers of {} are unreadable", m.id), e))?;
    Ok(QuestionarioResposta {
        id: m.id,
        aluno_id: m.aluno_id,
        aluno_nome: m.aluno_nome,
        data_preenchimento,
        respostas,
    })
}

pub async fn get_questionario(db: &SqlitePool) -> Result<Questionario, AppError> {
    let row = sqlx::query_as::<_, model::Questionario>(
        "SELECT id, titulo, descricao, questoes FROM questionario ORDER BY id LIMIT 1",
    )
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("Questionário não disponível."))?;
    questionario_model2schema(row)
}

fn field(q: i64) -> String {
    format!("q{}", q)
}

/// Whether the answer only carries the field its question type reads.
fn shape_matches(tipo: TipoQuestao, resposta: &Resposta) -> bool {
    let opcao = resposta.opcao_id.is_some();
    let texto = resposta.texto_resposta.is_some();
    let multiplas = resposta.multiplas.is_some();
    match tipo {
        TipoQuestao::Radio => !texto && !multiplas,
        TipoQuestao::Textarea => !opcao && !multiplas,
        TipoQuestao::CheckboxWithText => !opcao && !texto,
    }
}

fn check_resposta(errors: &mut FieldErrors, questao: &Questao, resposta: &Resposta) {
    let key = field(questao.id);
    if !shape_matches(questao.tipo, resposta) {
        errors.add(&key, "formatoInvalido");
        return;
    }
    match questao.tipo {
        TipoQuestao::Radio => match resposta.opcao_id.as_deref() {
            None => errors.add(&key, "required"),
            Some(id) if questao.opcao(id).is_none() => errors.add(&key, "invalidOpcao"),
            Some(_) => {}
        },
        TipoQuestao::Textarea => {
            if resposta.texto_resposta.as_deref().map_or(true, |t| t.trim().is_empty()) {
                errors.add(&key, "required");
            }
        }
        TipoQuestao::CheckboxWithText => {
            let multiplas = match resposta.multiplas.as_deref() {
                Some(m) if !m.is_empty() => m,
                _ => {
                    errors.add(&key, "required");
                    return;
                }
            };
            let mut seen = HashSet::new();
            for m in multiplas {
                let opcao = match questao.opcao(&m.opcao_id) {
                    Some(o) => o,
                    None => {
                        errors.add(&key, "invalidOpcao");
                        continue;
                    }
                };
                if !seen.insert(m.opcao_id.as_str()) {
                    errors.add(&key, "opcaoDuplicada");
                }
                let has_text = m.texto_adicional.as_deref().map_or(false, |t| !t.trim().is_empty());
                if has_text && !opcao.permite_campo_texto {
                    errors.add(&key, "textoNaoPermitido");
                }
            }
        }
    }
}

/// Checks the answers against the structure of the questionnaire. Errors are
/// keyed `q<question id>`.
pub fn validate_respostas(questionario: &Questionario, respostas: &[Resposta]) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    let mut answered = HashSet::new();

    for resposta in respostas {
        let questao = match questionario.questoes.iter().find(|q| q.id == resposta.questao_id) {
            Some(q) => q,
            None => {
                errors.add(&field(resposta.questao_id), "unknownQuestao");
                continue;
            }
        };
        if !answered.insert(questao.id) {
            errors.add(&field(questao.id), "duplicada");
            continue;
        }
        check_resposta(&mut errors, questao, resposta);
    }

    for questao in questionario.questoes.iter().filter(|q| q.obrigatoria) {
        if !answered.contains(&questao.id) {
            errors.add(&field(questao.id), "required");
        }
    }

    errors.into_result(INVALID_ANSWERS)
}

/// Stores the answers of the logged in student.
pub async fn salvar_resposta(
    db: &SqlitePool,
    session: &Session,
    respostas: Vec<Resposta>,
) -> Result<QuestionarioResposta, AppError> {
    let questionario = get_questionario(db).await?;
    validate_respostas(&questionario, &respostas)?;

    let record = QuestionarioResposta {
        id: Uuid::new_v4().to_string(),
        aluno_id: session.aluno_id,
        aluno_nome: session.nome.clone(),
        data_preenchimento: Utc::now(),
        respostas,
    };
    let json = serde_json::to_string(&record.respostas)
        .map_err(|e| AppError::internal("Could not serialize the answers", e))?;

    sqlx::query(
        r#"
        INSERT INTO questionario_respostas(id, aluno_id, aluno_nome, data_preenchimento, respostas)
        VALUES (?,?,?,?,?)
        "#,
    )
    .bind(&record.id)
    .bind(record.aluno_id)
    .bind(&record.aluno_nome)
    .bind(record.data_preenchimento.to_rfc3339())
    .bind(json)
    .execute(db)
    .await?;
    info!("Saved answers {} of aluno {}", record.id, record.aluno_id);

    Ok(record)
}

fn own_only(session: &Session, aluno_id: AlunoId) -> Result<(), AppError> {
    if session.aluno_id == aluno_id {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: "Só é possível consultar as próprias respostas.".to_string(),
        })
    }
}

/// Answers of a student, oldest first. Defaults to the session's student.
pub async fn respostas_por_aluno(
    db: &SqlitePool,
    session: &Session,
    aluno_id: Option<AlunoId>,
) -> Result<Vec<QuestionarioResposta>, AppError> {
    let aluno_id = aluno_id.unwrap_or(session.aluno_id);
    own_only(session, aluno_id)?;

    let rows = sqlx::query_as::<_, model::QuestionarioResposta>(
        r#"
        SELECT id, aluno_id, aluno_nome, data_preenchimento, respostas
        FROM questionario_respostas WHERE aluno_id = ? ORDER BY data_preenchimento
        "#,
    )
    .bind(aluno_id)
    .fetch_all(db)
    .await?;
    rows.into_iter().map(resposta_model2schema).collect()
}

pub async fn resposta_por_id(
    db: &SqlitePool,
    session: &Session,
    id: &str,
) -> Result<QuestionarioResposta, AppError> {
    let row = sqlx::query_as::<_, model::QuestionarioResposta>(
        r#"
        SELECT id, aluno_id, aluno_nome, data_preenchimento, respostas
        FROM questionario_respostas WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("Resposta não encontrada."))?;

    own_only(session, row.aluno_id)?;
    resposta_model2schema(row)
}
