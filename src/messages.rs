//! User-facing messages (pt-BR). Codes in error envelopes stay English.

pub const STUDENT_REGISTERED: &str = "Aluno registrado com sucesso!";
pub const STUDENT_INVALID: &str = "Dados inválidos. Verifique se nome e curso estão preenchidos.";
pub const STUDENT_FAILED: &str = "Erro ao registrar aluno";

pub const VEHICLE_REGISTERED: &str = "Veículo registrado com sucesso!";
pub const VEHICLE_FAILED: &str = "Erro ao registrar veículo";

pub const INCIDENT_REGISTERED: &str = "Incidente registrado com sucesso!";
pub const INCIDENT_FAILED: &str = "Erro ao registrar incidente";

pub const UPLOAD_FAILED: &str = "Erro ao fazer upload do arquivo";
pub const UPLOAD_NO_FILE: &str = "Por favor, selecione um arquivo";

pub fn upload_ok(file_name: &str) -> String {
    format!("Arquivo {file_name} enviado com sucesso!")
}

pub fn no_students(term: &str) -> String {
    if term.is_empty() {
        "Nenhum estudante encontrado".to_string()
    } else {
        format!("Nenhum aluno encontrado para \"{term}\".")
    }
}

pub fn no_vehicles(_term: &str) -> String {
    "Nenhum veículo encontrado".to_string()
}

pub fn no_routes(_term: &str) -> String {
    "Nenhuma rota encontrada".to_string()
}

pub fn no_incidents(_term: &str) -> String {
    "Nenhum incidente encontrado.".to_string()
}

pub fn no_logs(_term: &str) -> String {
    "Nenhum evento registrado".to_string()
}
