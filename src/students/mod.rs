//! Student records and the registration flow.
pub mod validation;

use crate::auth::{self, Session};
use crate::catalog;
use crate::date;
use crate::error::{AppError, FieldErrors};
use crate::ids::AlunoId;
use crate::model;
use crate::phone::format_phone;
use crate::schema::{Aluno, CadastroForm, CadastroPrefill, NovoAluno, Telefones};
use crate::AppState;
use log::info;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{SqliteConnection, SqlitePool};

const INVALID_FORM: &str = "Por favor, preencha todos os campos obrigatórios corretamente.";

const ALUNO_COLUMNS: &str = "id, nome, data_nasc, origem_id, curso_id, ano_formado, semestre_formado, \
    email, ddd_contato, tel_contato, ddd_celular, tel_celular, cep, logradouro, numero, bairro, \
    complemento, uf, cidade, ocupacao, empresa, ddd_comercial, tel_comercial";

pub(crate) fn aluno_model2schema(m: model::Aluno) -> Result<Aluno, AppError> {
    let data_nasc = date::parse_storage(&m.data_nasc).map_err(|e| {
        AppError::internal(format!("Stored birth date of aluno {} is unreadable", m.id), e)
    })?;

    let ano_formado = m.ano_formado.map(i32::try_from).transpose().map_err(|e| {
        AppError::internal(format!("Stored ano_formado of aluno {} is out of range", m.id), e)
    })?;

    Ok(Aluno {
        id: m.id,
        nome: m.nome,
        data_nasc,
        origem_id: m.origem_id,
        curso_id: m.curso_id,
        ano_formado,
        semestre_formado: m.semestre_formado,
        email: m.email,
        ddd_contato: m.ddd_contato,
        tel_contato: m.tel_contato,
        ddd_celular: m.ddd_celular,
        tel_celular: m.tel_celular,
        cep: m.cep,
        logradouro: m.logradouro,
        numero: m.numero,
        bairro: m.bairro,
        complemento: m.complemento,
        uf: m.uf,
        cidade: m.cidade,
        ocupacao: m.ocupacao,
        empresa: m.empresa,
        ddd_comercial: m.ddd_comercial,
        tel_comercial: m.tel_comercial,
    })
}

pub async fn list_alunos(db: &SqlitePool) -> Result<Vec<Aluno>, AppError> {
    let rows = sqlx::query_as::<_, model::Aluno>(&format!(
        "SELECT {} FROM alunos ORDER BY id",
        ALUNO_COLUMNS
    ))
    .fetch_all(db)
    .await?;

    rows.into_iter().map(aluno_model2schema).collect()
}

pub async fn find_aluno(db: &SqlitePool, id: AlunoId) -> Result<Option<Aluno>, AppError> {
    let row = sqlx::query_as::<_, model::Aluno>(&format!(
        "SELECT {} FROM alunos WHERE id = ?",
        ALUNO_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(aluno_model2schema).transpose()
}

pub async fn get_aluno(db: &SqlitePool, id: AlunoId) -> Result<Aluno, AppError> {
    find_aluno(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Não foi possível carregar os dados do aluno."))
}

/// Field checks plus the one rule that needs the catalog.
pub async fn validate_cadastro(db: &SqlitePool, form: &CadastroForm) -> Result<NovoAluno, AppError> {
    let novo = validation::check_form(form).map_err(|errors| AppError::Validation {
        message: INVALID_FORM.to_string(),
        errors,
    })?;

    if !catalog::curso_belongs_to(db, novo.curso_id, novo.origem_id).await? {
        let mut errors = FieldErrors::new();
        errors.add("cursoId", "cursoForaDaOrigem");
        errors.into_result(INVALID_FORM)?;
    }
    Ok(novo)
}

fn bind_novo_aluno<'q>(
    q: Query<'q, Sqlite, SqliteArguments<'q>>,
    a: &'q NovoAluno,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    q.bind(&a.nome)
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
}

pub async fn insert_aluno(db: &SqlitePool, novo: &NovoAluno) -> Result<AlunoId, AppError> {
    let q = sqlx::query(
        r#"
        INSERT INTO alunos(nome, data_nasc, origem_id, curso_id, ano_formado, semestre_formado,
            email, ddd_contato, tel_contato, ddd_celular, tel_celular, cep, logradouro, numero,
            bairro, complemento, uf, cidade, ocupacao, empresa, ddd_comercial, tel_comercial)
        VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
        "#,
    );
    let id = bind_novo_aluno(q, novo).execute(db).await?.last_insert_rowid();
    Ok(AlunoId(id))
}

pub async fn create_aluno(db: &SqlitePool, form: &CadastroForm) -> Result<Aluno, AppError> {
    let novo = validate_cadastro(db, form).await?;
    let id = insert_aluno(db, &novo).await?;
    info!("Created aluno {}", id);
    get_aluno(db, id).await
}

pub async fn update_aluno(db: &SqlitePool, id: AlunoId, form: &CadastroForm) -> Result<Aluno, AppError> {
    // fail with not found before reporting form errors
    get_aluno(db, id).await?;
    let novo = validate_cadastro(db, form).await?;

    {
        let mut con = db.acquire().await?;
        write_aluno(&mut *con, id, &novo).await?;
    }
    info!("Updated aluno {}", id);
    get_aluno(db, id).await
}

async fn write_aluno(con: &mut SqliteConnection, id: AlunoId, novo: &NovoAluno) -> Result<(), AppError> {
    let q = sqlx::query(
        r#"
        UPDATE alunos SET nome = ?, data_nasc = ?, origem_id = ?, curso_id = ?, ano_formado = ?,
            semestre_formado = ?, email = ?, ddd_contato = ?, tel_contato = ?, ddd_celular = ?,
            tel_celular = ?, cep = ?, logradouro = ?, numero = ?, bairro = ?, complemento = ?,
            uf = ?, cidade = ?, ocupacao = ?, empresa = ?, ddd_comercial = ?, tel_comercial = ?
        WHERE id = ?
        "#,
    );
    let done = bind_novo_aluno(q, novo).bind(id).execute(&mut *con).await?;
    if done.rows_affected() == 0 {
        return Err(AppError::not_found("Não foi possível carregar os dados do aluno."));
    }
    Ok(())
}

pub fn prefill_from(aluno: &Aluno) -> CadastroPrefill {
    CadastroPrefill {
        aluno_id: aluno.id,
        form: CadastroForm {
            nome: aluno.nome.clone(),
            data_nasc: date::to_ui(aluno.data_nasc),
            origem_id: Some(aluno.origem_id),
            curso_id: Some(aluno.curso_id),
            ano_formado: aluno.ano_formado.map(|a| a.to_string()).unwrap_or_default(),
            semestre_formado: aluno.semestre_formado.clone(),
            email: aluno.email.clone(),
            ddd_contato: aluno.ddd_contato.clone(),
            tel_contato: aluno.tel_contato.clone(),
            ddd_celular: aluno.ddd_celular.clone(),
            tel_celular: aluno.tel_celular.clone(),
            cep: aluno.cep.clone(),
            logradouro: aluno.logradouro.clone(),
            numero: aluno.numero.clone(),
            bairro: aluno.bairro.clone(),
            complemento: aluno.complemento.clone(),
            uf: aluno.uf.clone(),
            cidade: aluno.cidade.clone(),
            ocupacao: aluno.ocupacao.clone(),
            empresa: aluno.empresa.clone(),
            ddd_comercial: aluno.ddd_comercial.clone(),
            tel_comercial: aluno.tel_comercial.clone(),
        },
        telefones: Telefones {
            contato: format_phone(Some(&aluno.ddd_contato), Some(&aluno.tel_contato)),
            celular: format_phone(aluno.ddd_celular.as_deref(), aluno.tel_celular.as_deref()),
            comercial: format_phone(aluno.ddd_comercial.as_deref(), aluno.tel_comercial.as_deref()),
        },
    }
}

pub async fn cadastro_prefill(db: &SqlitePool, id: AlunoId) -> Result<CadastroPrefill, AppError> {
    Ok(prefill_from(&get_aluno(db, id).await?))
}

/// Saves the confirmed registration data, creates the account the student
/// will log in with next time and opens a session for it.
///
/// The record update and the account are written in one transaction, either
/// both are kept or neither.
pub async fn complete_registration(
    state: &AppState,
    id: AlunoId,
    form: &CadastroForm,
) -> Result<(Aluno, Session), AppError> {
    let db = &state.db;
    if auth::has_account(db, id).await? {
        return Err(AppError::Conflict {
            message: "Aluno já possui cadastro. Faça login.".to_string(),
        });
    }
    get_aluno(db, id).await?;
    let novo = validate_cadastro(db, form).await?;

    let mut tx = db.begin().await?;
    write_aluno(&mut *tx, id, &novo).await?;
    auth::insert_account(&mut *tx, id, &novo.nome, novo.data_nasc, novo.curso_id, None).await?;
    tx.commit().await?;

    let aluno = get_aluno(db, id).await?;
    let user = auth::find_user_by_aluno(db, id)
        .await?
        .ok_or_else(|| AppError::internal("Newly inserted account is missing", id))?;
    let session = auth::open_session(state, &user).await?;
    info!("Registration of aluno {} completed", id);

    Ok((aluno, session))
}
