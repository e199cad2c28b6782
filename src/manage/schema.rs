use crate::questionnaire::schema::Questionario;
use crate::schema::{Aluno, Curso, Endereco, Origem, Usuario};
use serde::Serialize;

/// The files a seed directory may hold, in the order they have to be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedFile {
    Origens,
    Cursos,
    Alunos,
    Usuarios,
    Enderecos,
    Questionario,
}

impl SeedFile {
    pub const ALL: [SeedFile; 6] = [
        SeedFile::Origens,
        SeedFile::Cursos,
        SeedFile::Alunos,
        SeedFile::Usuarios,
        SeedFile::Enderecos,
        SeedFile::Questionario,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SeedFile::Origens => "origens.json",
            SeedFile::Cursos => "cursos.json",
            SeedFile::Alunos => "alunos.json",
            SeedFile::Usuarios => "usuarios.json",
            SeedFile::Enderecos => "enderecos.json",
            SeedFile::Questionario => "questionario.json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }
}

/// Everything read from a seed directory. Missing files stay empty.
#[derive(Debug, Default)]
pub struct Seed {
    pub origens: Vec<Origem>,
    pub cursos: Vec<Curso>,
    pub alunos: Vec<Aluno>,
    pub usuarios: Vec<Usuario>,
    pub enderecos: Vec<Endereco>,
    pub questionario: Option<Questionario>,
}

/// Rows actually inserted per table; rows whose id already existed are not counted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub origens: u64,
    pub cursos: u64,
    pub alunos: u64,
    pub usuarios: u64,
    pub enderecos: u64,
    pub questionario: u64,
}

impl SeedReport {
    pub fn total(&self) -> u64 {
        self.origens + self.cursos + self.alunos + self.usuarios + self.enderecos + self.questionario
    }
}
