pub mod gateway;
pub mod platform;
pub mod terminal;

use log::{ error, warn };

use crate::history::ConversationStore;
use crate::models::chat::{ ContentPart, Message };
use self::gateway::CompletionGateway;
use self::platform::{ CaptureError, CapturedImage, CaptureSurface, ChatView };

/// Sent in place of an empty annotation on the capture path. Never rendered.
pub const DEFAULT_CAPTURE_PROMPT: &str = "Please solve this briefly, just the answer.";
pub const SEND_FAILURE_NOTICE: &str = "⚠️ No se pudo obtener respuesta. Intenta de nuevo.";
pub const NO_CAPTURE_ALERT: &str = "Primero toma una captura.";
pub const CLIPBOARD_OK_ALERT: &str = "Imagen copiada al portapapeles ✅";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Rendered,
    Failed,
}

/// Orchestrates one round trip at a time: build the user message, append it,
/// send the full history, render the reply. Owns all session state with an
/// explicit create/reset lifecycle.
pub struct TurnController {
    store: ConversationStore,
    gateway: Box<dyn CompletionGateway>,
    view: Box<dyn ChatView>,
    surface: Box<dyn CaptureSurface>,
    state: TurnState,
    last_outcome: Option<TurnOutcome>,
    text_input: String,
    pending_image: Option<String>,
    last_capture: Option<CapturedImage>,
}

impl TurnController {
    pub fn new(
        gateway: Box<dyn CompletionGateway>,
        view: Box<dyn ChatView>,
        surface: Box<dyn CaptureSurface>,
    ) -> Self {
        Self {
            store: ConversationStore::new(),
            gateway,
            view,
            surface,
            state: TurnState::Idle,
            last_outcome: None,
            text_input: String::new(),
            pending_image: None,
            last_capture: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        self.last_outcome
    }

    pub fn set_text(&mut self, text: &str) {
        self.text_input = text.to_string();
    }

    /// Paste path: remember the image and show its preview.
    pub fn paste_image(&mut self, data_uri: String) {
        self.view.show_image_preview(&data_uri);
        self.pending_image = Some(data_uri);
    }

    pub fn clear_pending_image(&mut self) {
        self.pending_image = None;
        self.view.clear_image_preview();
    }

    /// Explicit session teardown/reset: history and transient input go, the
    /// collaborators stay.
    pub fn reset(&mut self) {
        self.store.clear();
        self.text_input.clear();
        self.clear_pending_image();
        self.last_capture = None;
        self.last_outcome = None;
        self.state = TurnState::Idle;
    }

    /// Typed-message path. Empty text with no pending image is a no-op.
    pub async fn submit_text(&mut self) {
        if self.reject_if_busy() {
            return;
        }

        let text = self.text_input.trim().to_string();
        let image = self.pending_image.clone();
        if text.is_empty() && image.is_none() {
            return;
        }

        if !text.is_empty() {
            self.view.render_user_text(&text);
        }
        if let Some(uri) = &image {
            self.view.render_user_image(uri);
        }

        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(ContentPart::text(text.as_str()));
        }
        if let Some(uri) = image {
            parts.push(ContentPart::image(uri));
        }

        self.text_input.clear();
        self.clear_pending_image();
        self.store.append(Message::user(parts));
        self.send_turn().await;
    }

    /// Capture path: the last capture plus an optional annotation. When the
    /// annotation is empty the fixed instruction is sent in its place, but
    /// only the image (and the user's own words, if any) is rendered.
    pub async fn submit_capture(&mut self, annotation: &str) {
        if self.reject_if_busy() {
            return;
        }

        let Some(capture) = self.last_capture.clone() else {
            self.view.alert(NO_CAPTURE_ALERT);
            return;
        };
        let uri = capture.to_data_uri();
        let annotation = annotation.trim();

        self.view.render_user_image(&uri);
        if !annotation.is_empty() {
            self.view.render_user_text(annotation);
        }

        let hidden = if annotation.is_empty() { DEFAULT_CAPTURE_PROMPT } else { annotation };
        self.store.append(Message::user(vec![
            ContentPart::text(hidden),
            ContentPart::image(uri),
        ]));
        self.send_turn().await;
    }

    /// Ask the platform for a frame. A declined permission is not an error.
    pub fn capture_screen(&mut self) {
        match self.surface.capture() {
            Ok(image) => {
                self.last_capture = Some(image);
            }
            Err(CaptureError::PermissionDenied) => {}
            Err(e) => {
                self.view.alert(&format!("Error al capturar pantalla: {}", e));
            }
        }
    }

    pub fn copy_capture(&mut self) {
        let Some(capture) = self.last_capture.clone() else {
            self.view.alert(NO_CAPTURE_ALERT);
            return;
        };
        match self.surface.copy_to_clipboard(&capture) {
            Ok(()) => self.view.alert(CLIPBOARD_OK_ALERT),
            Err(e) => self.view.alert(&format!("No se pudo copiar la imagen: {}", e)),
        }
    }

    fn reject_if_busy(&mut self) -> bool {
        if self.state == TurnState::Sending {
            warn!("Turno en curso; envío rechazado");
            return true;
        }
        false
    }

    async fn send_turn(&mut self) {
        self.state = TurnState::Sending;
        self.last_outcome = Some(match self.gateway.complete(self.store.payload()).await {
            Ok(text) => {
                self.view.render_assistant(&text);
                self.store.append(Message::assistant(text));
                TurnOutcome::Rendered
            }
            Err(e) => {
                error!("Error al comunicarse con IA: {}", e);
                self.view.render_notice(SEND_FAILURE_NOTICE);
                TurnOutcome::Failed
            }
        });
        self.state = TurnState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{ Arc, Mutex };
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use crate::models::chat::Role;
    use super::gateway::GatewayError;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum ViewEvent {
        UserText(String),
        UserImage(String),
        Assistant(String),
        Notice(String),
        Alert(String),
        Preview(String),
        ClearPreview,
    }

    #[derive(Clone, Default)]
    struct RecordingView {
        events: Arc<Mutex<Vec<ViewEvent>>>,
    }

    impl RecordingView {
        fn events(&self) -> Vec<ViewEvent> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: ViewEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ChatView for RecordingView {
        fn render_user_text(&mut self, text: &str) {
            self.push(ViewEvent::UserText(text.to_string()));
        }
        fn render_user_image(&mut self, data_uri: &str) {
            self.push(ViewEvent::UserImage(data_uri.to_string()));
        }
        fn render_assistant(&mut self, text: &str) {
            self.push(ViewEvent::Assistant(text.to_string()));
        }
        fn render_notice(&mut self, text: &str) {
            self.push(ViewEvent::Notice(text.to_string()));
        }
        fn alert(&mut self, text: &str) {
            self.push(ViewEvent::Alert(text.to_string()));
        }
        fn show_image_preview(&mut self, data_uri: &str) {
            self.push(ViewEvent::Preview(data_uri.to_string()));
        }
        fn clear_image_preview(&mut self) {
            self.push(ViewEvent::ClearPreview);
        }
    }

    enum GatewayBehavior {
        Reply(&'static str),
        Timeout,
    }

    struct MockGateway {
        behavior: GatewayBehavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompletionGateway for MockGateway {
        async fn complete(&self, _history: &[Message]) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                GatewayBehavior::Reply(text) => Ok(text.to_string()),
                GatewayBehavior::Timeout => Err(GatewayError::Timeout),
            }
        }
    }

    enum SurfaceBehavior {
        Frame,
        Denied,
        Broken,
    }

    struct MockSurface {
        behavior: SurfaceBehavior,
        clipboard_ok: bool,
    }

    impl CaptureSurface for MockSurface {
        fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
            match self.behavior {
                SurfaceBehavior::Frame => Ok(CapturedImage {
                    mime: "image/png".to_string(),
                    bytes: b"abc".to_vec(),
                }),
                SurfaceBehavior::Denied => Err(CaptureError::PermissionDenied),
                SurfaceBehavior::Broken => Err(CaptureError::Other("sin pantalla".to_string())),
            }
        }

        fn copy_to_clipboard(&mut self, _image: &CapturedImage) -> Result<(), CaptureError> {
            if self.clipboard_ok {
                Ok(())
            } else {
                Err(CaptureError::PermissionDenied)
            }
        }
    }

    struct Fixture {
        controller: TurnController,
        view: RecordingView,
        calls: Arc<AtomicUsize>,
    }

    fn fixture(gateway: GatewayBehavior, surface: SurfaceBehavior) -> Fixture {
        let view = RecordingView::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = TurnController::new(
            Box::new(MockGateway { behavior: gateway, calls: calls.clone() }),
            Box::new(view.clone()),
            Box::new(MockSurface { behavior: surface, clipboard_ok: true }),
        );
        Fixture { controller, view, calls }
    }

    const CAPTURE_URI: &str = "data:image/png;base64,YWJj";

    fn text_of(part: &ContentPart) -> &str {
        match part {
            ContentPart::Text { text } => text,
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_submit_is_a_no_op() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.set_text("   ");
        f.controller.submit_text().await;

        assert!(f.controller.store().is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        assert!(f.view.events().is_empty());
    }

    #[tokio::test]
    async fn text_turn_appends_user_then_assistant() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.set_text("2+2?");
        f.controller.submit_text().await;

        let payload = f.controller.store().payload();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].role, Role::User);
        assert_eq!(payload[1].role, Role::Assistant);
        assert_eq!(text_of(&payload[1].content[0]), "4");
        assert_eq!(f.controller.last_outcome(), Some(TurnOutcome::Rendered));
        assert_eq!(f.controller.state(), TurnState::Idle);

        let events = f.view.events();
        assert!(events.contains(&ViewEvent::UserText("2+2?".to_string())));
        assert!(events.contains(&ViewEvent::Assistant("4".to_string())));
    }

    #[tokio::test]
    async fn pasted_image_is_sent_and_the_preview_cleared() {
        let mut f = fixture(GatewayBehavior::Reply("ok"), SurfaceBehavior::Frame);
        f.controller.paste_image(CAPTURE_URI.to_string());
        f.controller.submit_text().await;

        let payload = f.controller.store().payload();
        assert_eq!(payload[0].content.len(), 1);
        assert!(matches!(payload[0].content[0], ContentPart::ImageUrl { .. }));

        let events = f.view.events();
        assert!(events.contains(&ViewEvent::Preview(CAPTURE_URI.to_string())));
        assert!(events.contains(&ViewEvent::UserImage(CAPTURE_URI.to_string())));
        assert!(events.contains(&ViewEvent::ClearPreview));
    }

    #[tokio::test]
    async fn failed_turn_keeps_the_user_message_and_appends_nothing() {
        let mut f = fixture(GatewayBehavior::Timeout, SurfaceBehavior::Frame);
        f.controller.set_text("hola");
        f.controller.submit_text().await;

        let payload = f.controller.store().payload();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].role, Role::User);
        assert_eq!(f.controller.last_outcome(), Some(TurnOutcome::Failed));
        assert_eq!(f.controller.state(), TurnState::Idle);
        assert!(f.view.events().contains(&ViewEvent::Notice(SEND_FAILURE_NOTICE.to_string())));
    }

    #[tokio::test]
    async fn busy_guard_rejects_overlapping_submits() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.state = TurnState::Sending;
        f.controller.set_text("2+2?");
        f.controller.submit_text().await;

        assert!(f.controller.store().is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capture_with_empty_annotation_sends_the_hidden_instruction() {
        let mut f = fixture(GatewayBehavior::Reply("42"), SurfaceBehavior::Frame);
        f.controller.capture_screen();
        f.controller.submit_capture("").await;

        let payload = f.controller.store().payload();
        assert_eq!(text_of(&payload[0].content[0]), DEFAULT_CAPTURE_PROMPT);
        assert!(matches!(payload[0].content[1], ContentPart::ImageUrl { .. }));

        // Only the image bubble is rendered; the instruction stays hidden.
        let events = f.view.events();
        assert!(events.contains(&ViewEvent::UserImage(CAPTURE_URI.to_string())));
        assert!(!events.iter().any(|e| matches!(e, ViewEvent::UserText(_))));
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capture_annotation_replaces_the_default_and_is_rendered() {
        let mut f = fixture(GatewayBehavior::Reply("una gráfica"), SurfaceBehavior::Frame);
        f.controller.capture_screen();
        f.controller.submit_capture("¿qué muestra esto?").await;

        let payload = f.controller.store().payload();
        assert_eq!(text_of(&payload[0].content[0]), "¿qué muestra esto?");
        assert!(f.view.events().contains(&ViewEvent::UserText("¿qué muestra esto?".to_string())));
    }

    #[tokio::test]
    async fn submitting_without_a_capture_alerts_and_sends_nothing() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.submit_capture("hola").await;

        assert!(f.controller.store().is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
        assert!(f.view.events().contains(&ViewEvent::Alert(NO_CAPTURE_ALERT.to_string())));
    }

    #[tokio::test]
    async fn capture_permission_denial_is_swallowed() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Denied);
        f.controller.capture_screen();

        assert!(f.view.events().is_empty());
        f.controller.submit_capture("").await;
        assert!(f.view.events().contains(&ViewEvent::Alert(NO_CAPTURE_ALERT.to_string())));
    }

    #[tokio::test]
    async fn capture_failures_other_than_denial_are_alerted() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Broken);
        f.controller.capture_screen();

        assert!(f.view.events().iter().any(|e| matches!(
            e,
            ViewEvent::Alert(text) if text.contains("sin pantalla")
        )));
    }

    #[tokio::test]
    async fn copy_capture_reports_each_clipboard_contract() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.copy_capture();
        assert!(f.view.events().contains(&ViewEvent::Alert(NO_CAPTURE_ALERT.to_string())));

        f.controller.capture_screen();
        f.controller.copy_capture();
        assert!(f.view.events().contains(&ViewEvent::Alert(CLIPBOARD_OK_ALERT.to_string())));

        let view = RecordingView::default();
        let mut denied = TurnController::new(
            Box::new(MockGateway {
                behavior: GatewayBehavior::Reply("4"),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(view.clone()),
            Box::new(MockSurface { behavior: SurfaceBehavior::Frame, clipboard_ok: false }),
        );
        denied.capture_screen();
        denied.copy_capture();
        assert!(view.events().iter().any(|e| matches!(
            e,
            ViewEvent::Alert(text) if text.starts_with("No se pudo copiar la imagen:")
        )));
    }

    #[tokio::test]
    async fn reset_clears_history_and_transient_state() {
        let mut f = fixture(GatewayBehavior::Reply("4"), SurfaceBehavior::Frame);
        f.controller.set_text("hola");
        f.controller.submit_text().await;
        f.controller.paste_image(CAPTURE_URI.to_string());
        f.controller.reset();

        assert!(f.controller.store().is_empty());
        assert_eq!(f.controller.last_outcome(), None);
        f.controller.submit_text().await;
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }
}
