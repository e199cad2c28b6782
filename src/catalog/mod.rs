//! Lookup tables: origins, courses, semesters and the address lookup by CEP.
use crate::error::{AppError, FieldErrors};
use crate::ids::{CursoId, OrigemId};
use crate::schema::{Curso, Endereco, Origem, Semestre};
use log::debug;
use sqlx::SqlitePool;

pub const SEMESTRES: [Semestre; 2] = [
    Semestre { id: "1", nome: "1º Semestre" },
    Semestre { id: "2", nome: "2º Semestre" },
];

pub async fn list_origens(db: &SqlitePool) -> Result<Vec<Origem>, AppError> {
    let origens = sqlx::query_as::<_, Origem>("SELECT id, nome FROM origens ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(origens)
}

/// Courses of one origin, or all of them when no origin is given.
pub async fn list_cursos(db: &SqlitePool, origem: Option<OrigemId>) -> Result<Vec<Curso>, AppError> {
    let cursos = match origem {
        Some(origem_id) => {
            sqlx::query_as::<_, Curso>(
                "SELECT id, nome, origem_id FROM cursos WHERE origem_id = ? ORDER BY nome",
            )
            .bind(origem_id)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Curso>("SELECT id, nome, origem_id FROM cursos ORDER BY nome")
                .fetch_all(db)
                .await?
        }
    };
    debug!("{} cursos for origem {:?}", cursos.len(), origem);
    Ok(cursos)
}

pub fn list_semestres() -> Vec<Semestre> {
    SEMESTRES.to_vec()
}

pub fn is_semestre(id: &str) -> bool {
    SEMESTRES.iter().any(|s| s.id == id)
}

pub async fn get_curso(db: &SqlitePool, id: CursoId) -> Result<Option<Curso>, AppError> {
    let curso = sqlx::query_as::<_, Curso>("SELECT id, nome, origem_id FROM cursos WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(curso)
}

pub async fn curso_belongs_to(db: &SqlitePool, curso: CursoId, origem: OrigemId) -> Result<bool, AppError> {
    Ok(matches!(get_curso(db, curso).await?, Some(c) if c.origem_id == origem))
}

/// Strips the usual separators; `None` unless eight digits are left.
pub fn normalize_cep(raw: &str) -> Option<String> {
    let cep: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect();
    if cep.len() == 8 && cep.bytes().all(|b| b.is_ascii_digit()) {
        Some(cep)
    } else {
        None
    }
}

pub async fn find_endereco(db: &SqlitePool, raw_cep: &str) -> Result<Endereco, AppError> {
    let cep = match normalize_cep(raw_cep) {
        Some(c) => c,
        None => {
            let mut errors = FieldErrors::new();
            errors.add("cep", "pattern");
            return Err(AppError::Validation {
                message: "Informe um CEP válido.".to_string(),
                errors,
            });
        }
    };

    sqlx::query_as::<_, Endereco>(
        "SELECT cep, logradouro, bairro, cidade, uf FROM enderecos WHERE cep = ?",
    )
    .bind(&cep)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("CEP não encontrado."))
}
