//! Result text for the HUD, results screen and share sheet

use crate::flow::Scoreboard;

pub const SHARE_TITLE: &str = "Rosita Básquetbol - Juego Interactivo";

/// How the share attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Native share sheet accepted it
    Shared,
    /// Text copied to the clipboard
    Copied,
    /// Nothing worked; show the URL for manual copying
    Manual(String),
}

pub fn score_label(board: &Scoreboard) -> String {
    format!("Puntos: {}", board.score)
}

pub fn attempts_label(board: &Scoreboard) -> String {
    format!("Intentos: {}", board.remaining)
}

pub fn progress_label(percent: u8) -> String {
    format!("{}%", percent)
}

pub fn final_score_line(board: &Scoreboard) -> String {
    format!("Puntos obtenidos: {}/{}", board.score, board.max_attempts)
}

pub fn game_over_banner(board: &Scoreboard) -> String {
    format!(
        "¡Juego Terminado!\nPuntuación: {}/{}",
        board.score, board.max_attempts
    )
}

pub fn share_text(board: &Scoreboard) -> String {
    format!(
        "¡Completé el juego de Rosita! Obtuve {}/{} puntos en el básquet 🏀",
        board.score, board.max_attempts
    )
}

/// Clipboard fallback: message plus link
pub fn clipboard_text(board: &Scoreboard, url: &str) -> String {
    format!("{} - {}", share_text(board), url)
}

/// Alert text after a share attempt; the native sheet needs none
pub fn outcome_message(outcome: &ShareOutcome) -> Option<String> {
    match outcome {
        ShareOutcome::Shared => None,
        ShareOutcome::Copied => Some("¡Enlace copiado al portapapeles!".to_string()),
        ShareOutcome::Manual(url) => Some(format!(
            "No se pudo copiar automáticamente. URL: {}",
            url
        )),
    }
}
