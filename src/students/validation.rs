//! Field rules of the registration form.
use crate::catalog::{is_semestre, normalize_cep};
use crate::date;
use crate::error::FieldErrors;
use crate::schema::{non_empty, CadastroForm, NovoAluno};
use once_cell::sync::Lazy;
use regex::Regex;

static NOME_FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9.,!@#$%¨&*()+\-/<>;?\[\]{}|§£¢]").expect("nome regex"));
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static DDD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}$").expect("ddd regex"));
static TELEFONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8,9}$").expect("telefone regex"));
static ANO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("ano regex"));
static NUMERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("numero regex"));

pub const REQUIRED: &str = "required";
pub const PATTERN: &str = "pattern";

fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        None
    } else {
        Some(value)
    }
}

fn matches(errors: &mut FieldErrors, field: &str, value: Option<&str>, re: &Regex) {
    if let Some(v) = value {
        if !re.is_match(v) {
            errors.add(field, PATTERN);
        }
    }
}

/// A (ddd, telefone) pair where filling one half makes the other required.
fn optional_phone(
    errors: &mut FieldErrors,
    (ddd_field, ddd): (&str, Option<&str>),
    (tel_field, tel): (&str, Option<&str>),
) {
    match (ddd, tel) {
        (Some(_), None) => errors.add(tel_field, REQUIRED),
        (None, Some(_)) => errors.add(ddd_field, REQUIRED),
        _ => {}
    }
    matches(errors, ddd_field, ddd, &DDD);
    matches(errors, tel_field, tel, &TELEFONE);
}

pub fn valid_nome(nome: &str) -> bool {
    !NOME_FORBIDDEN.is_match(nome)
}

/// Checks every field of the form and returns the clean student data, or
/// all the field errors found.
///
/// Whether the course belongs to the origin needs the catalog and is checked
/// by the caller.
pub fn check_form(form: &CadastroForm) -> Result<NovoAluno, FieldErrors> {
    let mut errors = FieldErrors::new();

    let nome = required(&mut errors, "nome", &form.nome);
    if let Some(n) = nome {
        if !valid_nome(n) {
            errors.add("nome", "invalidNome");
        }
    }

    let data_nasc = match required(&mut errors, "dataNasc", &form.data_nasc) {
        Some(d) => match date::parse_birth_date(d) {
            Ok(d) => Some(d),
            Err(e) => {
                errors.add("dataNasc", e.code());
                None
            }
        },
        None => None,
    };

    if form.origem_id.is_none() {
        errors.add("origemId", REQUIRED);
    }
    if form.curso_id.is_none() {
        errors.add("cursoId", REQUIRED);
    }

    let ano_formado = required(&mut errors, "anoFormado", &form.ano_formado);
    matches(&mut errors, "anoFormado", ano_formado, &ANO);
    let ano_formado = ano_formado.and_then(|a| a.parse::<i32>().ok());

    let semestre = non_empty(&form.semestre_formado);
    if let Some(s) = semestre {
        if !is_semestre(s) {
            errors.add("semestreFormado", "invalidSemestre");
        }
    }

    let email = required(&mut errors, "email", &form.email);
    if let Some(e) = email {
        if !EMAIL.is_match(e) {
            errors.add("email", "email");
        }
    }

    let ddd_contato = required(&mut errors, "dddContato", &form.ddd_contato);
    matches(&mut errors, "dddContato", ddd_contato, &DDD);
    let tel_contato = required(&mut errors, "telContato", &form.tel_contato);
    matches(&mut errors, "telContato", tel_contato, &TELEFONE);

    optional_phone(
        &mut errors,
        ("dddCelular", non_empty(&form.ddd_celular)),
        ("telCelular", non_empty(&form.tel_celular)),
    );
    optional_phone(
        &mut errors,
        ("dddComercial", non_empty(&form.ddd_comercial)),
        ("telComercial", non_empty(&form.tel_comercial)),
    );

    let cep = match required(&mut errors, "cep", &form.cep) {
        Some(c) => {
            let normalized = normalize_cep(c);
            if normalized.is_none() {
                errors.add("cep", PATTERN);
            }
            normalized
        }
        None => None,
    };

    let logradouro = required(&mut errors, "logradouro", &form.logradouro);
    let numero = required(&mut errors, "numero", &form.numero);
    matches(&mut errors, "numero", numero, &NUMERO);
    let bairro = required(&mut errors, "bairro", &form.bairro);
    let uf = required(&mut errors, "uf", &form.uf);
    let cidade = required(&mut errors, "cidade", &form.cidade);

    if !errors.is_empty() {
        return Err(errors);
    }

    // no errors means every required field above is present
    match (
        nome, data_nasc, form.origem_id, form.curso_id, ano_formado, email, ddd_contato,
        tel_contato, cep, logradouro, numero, bairro, uf, cidade,
    ) {
        (
            Some(nome),
            Some(data_nasc),
            Some(origem_id),
            Some(curso_id),
            Some(ano_formado),
            Some(email),
            Some(ddd_contato),
            Some(tel_contato),
            Some(cep),
            Some(logradouro),
            Some(numero),
            Some(bairro),
            Some(uf),
            Some(cidade),
        ) => Ok(NovoAluno {
            nome: nome.to_string(),
            data_nasc,
            origem_id,
            curso_id,
            ano_formado,
            semestre_formado: semestre.map(str::to_string),
            email: email.to_string(),
            ddd_contato: ddd_contato.to_string(),
            tel_contato: tel_contato.to_string(),
            ddd_celular: non_empty(&form.ddd_celular).map(str::to_string),
            tel_celular: non_empty(&form.tel_celular).map(str::to_string),
            cep,
            logradouro: logradouro.to_string(),
            numero: numero.to_string(),
            bairro: bairro.to_string(),
            complemento: non_empty(&form.complemento).map(str::to_string),
            uf: uf.to_string(),
            cidade: cidade.to_string(),
            ocupacao: non_empty(&form.ocupacao).map(str::to_string),
            empresa: non_empty(&form.empresa).map(str::to_string),
            ddd_comercial: non_empty(&form.ddd_comercial).map(str::to_string),
            tel_comercial: non_empty(&form.tel_comercial).map(str::to_string),
        }),
        _ => {
            errors.add("form", "incomplete");
            Err(errors)
        }
    }
}
