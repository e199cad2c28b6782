pub mod schema;

use self::schema::{Seed, SeedFile, SeedReport};
use crate::date;
use crate::error::AppError;
use crate::ids::OrigemId;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManageError {
    #[error("Couldnt open seed file {path}: {error}")]
    Io { path: PathBuf, error: String },
    #[error("Couldnt read seed file {path}: {error}")]
    Parse { path: PathBuf, error: String },
    #[error("Curso {curso} references the unknown origem {origem}")]
    UnknownOrigem { curso: String, origem: OrigemId },
    #[error("Error while writing the seed: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ManageError {
    fn from(e: sqlx::Error) -> Self {
        ManageError::Database(e.to_string())
    }
}

impl From<ManageError> for AppError {
    fn from(e: ManageError) -> Self {
        AppError::internal("Error while loading the seed", e)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ManageError> {
    let file = File::open(path).map_err(|e| ManageError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ManageError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn check_file(kind: SeedFile, path: &Path) -> Result<(), ManageError> {
    let mut seed = Seed::default();
    read_into(&mut seed, kind, path)
}

fn read_into(seed: &mut Seed, kind: SeedFile, path: &Path) -> Result<(), ManageError> {
    match kind {
        SeedFile::Origens => seed.origens = read_json(path)?,
        SeedFile::Cursos => seed.cursos = read_json(path)?,
        SeedFile::Alunos => seed.alunos = read_json(path)?,
        SeedFile::Usuarios => seed.usuarios = read_json(path)?,
        SeedFile::Enderecos => seed.enderecos = read_json(path)?,
        SeedFile::Questionario => seed.questionario = Some(read_json(path)?),
    }
    Ok(())
}

/**
 * checks the given seed dir for syntax errors and if all the attributes are there
 *
 * Returns the known files that were found.
 */
pub fn check_seed(seed_dir: &Path) -> Result<Vec<SeedFile>, ManageError> {
    let mut found = vec![];
    for entry in walkdir::WalkDir::new(seed_dir).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                return Err(ManageError::Io {
                    path: seed_dir.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        if entry.path().is_dir() || entry.path().extension() != Some(OsStr::new("json")) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        match SeedFile::from_file_name(&name) {
            Some(kind) => {
                check_file(kind, entry.path())?;
                debug!("Seed file {:?} is fine", entry.path());
                found.push(kind);
            }
            None => warn!("Skipping unknown seed file {:?}", entry.path()),
        }
    }
    Ok(found)
}

pub fn read_seed(seed_dir: &Path) -> Result<Seed, ManageError> {
    let mut seed = Seed::default();
    for kind in SeedFile::ALL {
        let path = seed_dir.join(kind.file_name());
        if path.is_file() {
            read_into(&mut seed, kind, &path)?;
        }
    }
    Ok(seed)
}

/// Loads a seed directory into the database. Rows whose id already exists
/// are left alone, so loading twice is harmless.
pub async fn load_seed(seed_dir: &Path, db: &SqlitePool) -> Result<SeedReport, ManageError> {
    check_seed(seed_dir)?;
    let seed = read_seed(seed_dir)?;
    let mut report = SeedReport::default();
    let mut tx = db.begin().await?;

    for o in &seed.origens {
        report.origens += sqlx::query("INSERT OR IGNORE INTO origens(id, nome) VALUES (?,?)")
            .bind(o.id)
            .bind(&o.nome)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    let origens: HashSet<OrigemId> = sqlx::query_scalar::<_, OrigemId>("SELECT id FROM origens")
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
    for c in &seed.cursos {
        if !origens.contains(&c.origem_id) {
            return Err(ManageError::UnknownOrigem {
                curso: c.nome.clone(),
                origem: c.origem_id,
            });
        }
        report.cursos += sqlx::query("INSERT OR IGNORE INTO cursos(id, nome, origem_id) VALUES (?,?,?)")
            .bind(c.id)
            .bind(&c.nome)
            .bind(c.origem_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    for a in &seed.alunos {
        report.alunos += sqlx::query(
            r#"
            INSERT OR IGNORE INTO alunos(id, nome, data_nasc, origem_id, curso_id, ano_formado,
                semestre_formado, email, ddd_contato, tel_contato, ddd_celular, tel_celular, cep,
                logradouro, numero, bairro, complemento, uf, cidade, ocupacao, empresa,
                ddd_comercial, tel_comercial)
            VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(a.id)
        .bind(&a.nome)
        .bind(date::to_storage(a.data_nasc))
        .bind(a.origem_id)
        .bind(a.curso_id)
        .bind(a.ano_formado)
        .bind(&a.semestre_formado)
        .bind(&a.email)
        .bind(&a.ddd_contato)
        .bind(&a.tel_contato)
        .bind(&a.ddd_celular)
        .bind(&a.tel_celular)
        .bind(&a.cep)
        .bind(&a.logradouro)
        .bind(&a.numero)
        .bind(&a.bairro)
        .bind(&a.complemento)
        .bind(&a.uf)
        .bind(&a.cidade)
        .bind(&a.ocupacao)
        .bind(&a.empresa)
        .bind(&a.ddd_comercial)
        .bind(&a.tel_comercial)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for u in &seed.usuarios {
        report.usuarios += sqlx::query(
            r#"
            INSERT OR IGNORE INTO usuarios(id, aluno_id, nome, data_nasc, curso_id, numero_academico)
            VALUES (?,?,?,?,?,?)
            "#,
        )
        .bind(u.id)
        .bind(u.aluno_id)
        .bind(&u.nome)
        .bind(date::to_storage(u.data_nasc))
        .bind(u.curso_id)
        .bind(&u.numero_academico)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for e in &seed.enderecos {
        report.enderecos += sqlx::query(
            "INSERT OR IGNORE INTO enderecos(cep, logradouro, bairro, cidade, uf) VALUES (?,?,?,?,?)",
        )
        .bind(&e.cep)
        .bind(&e.logradouro)
        .bind(&e.bairro)
        .bind(&e.cidade)
        .bind(&e.uf)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    if let Some(q) = &seed.questionario {
        let questoes = serde_json::to_string(&q.questoes).map_err(|e| ManageError::Parse {
            path: seed_dir.join(SeedFile::Questionario.file_name()),
            error: e.to_string(),
        })?;
        report.questionario += sqlx::query(
            "INSERT OR IGNORE INTO questionario(id, titulo, descricao, questoes) VALUES (?,?,?,?)",
        )
        .bind(&q.id)
        .bind(&q.titulo)
        .bind(&q.descricao)
        .bind(questoes)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    info!("Loaded seed from {:?}: {} new rows", seed_dir, report.total());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{migrate_example_db, seed_dir};
    use std::fs;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("egresso-seed-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn shipped_seed_is_valid() {
        let found = check_seed(&seed_dir()).unwrap();
        for kind in SeedFile::ALL {
            assert!(found.contains(&kind), "{:?} missing", kind);
        }
    }

    #[test]
    fn broken_file_names_its_path() {
        let dir = scratch_dir();
        fs::write(dir.join("cursos.json"), r#"[{"id": 1, "nome": "x"}]"#).unwrap();
        fs::write(dir.join("notas.json"), "not even json").unwrap();
        match check_seed(&dir) {
            Err(ManageError::Parse { path, .. }) => assert!(path.ends_with("cursos.json")),
            other => panic!("expected parse error, got {:?}", other),
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unknown_files_are_skipped() {
        let dir = scratch_dir();
        fs::write(dir.join("origens.json"), r#"[{"id": 1, "nome": "Graduação"}]"#).unwrap();
        fs::write(dir.join("notas.json"), "not even json").unwrap();
        assert_eq!(check_seed(&dir).unwrap(), vec![SeedFile::Origens]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[actix_rt::test]
    async fn loading_twice_adds_nothing() {
        let db = migrate_example_db().await;
        let first = load_seed(&seed_dir(), &db).await.unwrap();
        assert_eq!(first.origens, 3);
        assert_eq!(first.alunos, 4);
        assert_eq!(first.questionario, 1);

        let second = load_seed(&seed_dir(), &db).await.unwrap();
        assert_eq!(second.total(), 0);
    }

    #[actix_rt::test]
    async fn curso_needs_its_origem() {
        let db = migrate_example_db().await;
        let dir = scratch_dir();
        fs::write(dir.join("origens.json"), r#"[{"id": 1, "nome": "Graduação"}]"#).unwrap();
        fs::write(
            dir.join("cursos.json"),
            r#"[{"id": 501, "nome": "Mestrado", "origemId": "5"}]"#,
        )
        .unwrap();
        match load_seed(&dir, &db).await {
            Err(ManageError::UnknownOrigem { origem, .. }) => assert_eq!(origem, OrigemId(5)),
            other => panic!("expected unknown origem, got {:?}", other),
        }
        // nothing of the failed load is kept
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM origens")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);
        fs::remove_dir_all(dir).unwrap();
    }
}
