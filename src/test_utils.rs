use std::sync::Arc;
use tokio::sync::mpsc;

pub fn contains_response_of_type<T>(responses: &[Arc<T>], variant: &T) -> bool {
    responses
        .iter()
        .any(|msg| std::mem::discriminant(&**msg) == std::mem::discriminant(variant))
}

/// Everything already queued on a client channel, without waiting.
pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<Arc<T>>) -> Vec<Arc<T>> {
    let mut received = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        received.push(msg);
    }
    received
}
