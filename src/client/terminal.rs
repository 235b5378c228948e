use std::error::Error;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex };
use log::info;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::models::chat::data_uri;
use super::TurnController;
use super::gateway::HttpGateway;
use super::platform::{ mime_for, ChatView, FileCapture };

/// Stdout rendering of the chat, one line per bubble. Inline image payloads
/// are summarized instead of dumped.
#[derive(Default)]
pub struct TerminalView;

impl ChatView for TerminalView {
    fn render_user_text(&mut self, text: &str) {
        println!("Tú: {}", text);
    }

    fn render_user_image(&mut self, data_uri: &str) {
        println!("Tú (imagen): [{} bytes inline]", data_uri.len());
    }

    fn render_assistant(&mut self, text: &str) {
        println!("IA: {}", text);
    }

    fn render_notice(&mut self, text: &str) {
        println!("Sistema: {}", text);
    }

    fn alert(&mut self, text: &str) {
        eprintln!("[aviso] {}", text);
    }

    fn show_image_preview(&mut self, data_uri: &str) {
        println!("(imagen adjunta, {} bytes inline; se enviará con el próximo mensaje)", data_uri.len());
    }

    fn clear_image_preview(&mut self) {}
}

fn print_help() {
    println!("Comandos:");
    println!("  /img <ruta>      adjuntar una imagen al próximo mensaje");
    println!("  /quitar          descartar la imagen adjunta");
    println!("  /captura <ruta>  tomar una captura desde un archivo");
    println!("  /copiar          copiar la última captura al portapapeles");
    println!("  /enviar [texto]  enviar la captura, con anotación opcional");
    println!("  /reiniciar       vaciar la conversación");
    println!("  /salir           terminar la sesión");
    println!("Cualquier otra línea se envía como mensaje.");
}

/// Interactive session against a running gateway.
pub async fn run(gateway_url: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let source: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let gateway = HttpGateway::new(gateway_url)?;
    let mut controller = TurnController::new(
        Box::new(gateway),
        Box::new(TerminalView),
        Box::new(FileCapture::new(source.clone())),
    );

    info!("Cliente de terminal conectado a {}", gateway_url);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line
            .split_once(' ')
            .map(|(c, rest)| (c, rest.trim()))
            .unwrap_or((line, ""));

        match command {
            "/salir" => break,
            "/ayuda" => print_help(),
            "/img" if !rest.is_empty() => match std::fs::read(rest) {
                Ok(bytes) => {
                    let mime = mime_for(Path::new(rest));
                    controller.paste_image(data_uri(mime, &bytes));
                }
                Err(e) => eprintln!("[aviso] No se pudo leer la imagen: {}", e),
            },
            "/quitar" => controller.clear_pending_image(),
            "/captura" => {
                if !rest.is_empty() {
                    *source.lock().unwrap() = Some(PathBuf::from(rest));
                }
                controller.capture_screen();
            }
            "/copiar" => controller.copy_capture(),
            "/enviar" => controller.submit_capture(rest).await,
            "/reiniciar" => controller.reset(),
            _ => {
                controller.set_text(line);
                controller.submit_text().await;
            }
        }
    }

    Ok(())
}
