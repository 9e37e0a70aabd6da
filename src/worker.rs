// ============================================================================
// Worker : un thread éphémère par soumission
// ============================================================================
// CONCEPT RUST : Thread + runtime async + channel
// - std::thread : le téléchargement ne bloque jamais le thread UI
// - tokio runtime propre au thread : exécute le Fetcher async avec block_on
// - mpsc::Sender : le résultat est posté dans la file de l'UI, qui est la
//   seule à modifier l'état de l'application
//
// Pas de pool, pas d'annulation, pas de timeout : une requête lancée va
// jusqu'au bout (succès, erreur gérée, ou panic convertie en erreur système).
// ============================================================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::api::PriceSource;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::models::Request;

/// Messages postés par le worker vers le thread UI
#[derive(Debug)]
pub enum WorkerMessage {
    /// CSV écrit avec succès
    FetchSucceeded { request: Request, outcome: FetchOutcome },

    /// Échec (ticker introuvable ou erreur système), message prêt à afficher
    FetchFailed { request: Request, message: String },
}

/// Lance le téléchargement dans un nouveau thread
///
/// Le thread envoie exactement un WorkerMessage puis se termine.
pub fn spawn_fetch<S>(
    fetcher: Arc<Fetcher<S>>,
    request: Request,
    result_tx: Sender<WorkerMessage>,
) -> std::io::Result<JoinHandle<()>>
where
    S: PriceSource + Send + Sync + 'static,
{
    thread::Builder::new()
        .name("fetch-worker".to_string())
        .spawn(move || {
            info!(ticker = %request.raw_ticker, "Worker started");
            let message = run_fetch(&fetcher, request);

            // L'UI a pu se fermer entre-temps : plus personne à prévenir
            if result_tx.send(message).is_err() {
                info!("Result channel closed, dropping worker result");
            }
        })
}

/// Exécute la requête et la convertit en message pour l'UI
fn run_fetch<S: PriceSource>(fetcher: &Fetcher<S>, request: Request) -> WorkerMessage {
    // CONCEPT : Runtime per-thread
    // - current_thread suffit : une seule requête à la fois dans ce thread
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            return WorkerMessage::FetchFailed {
                request,
                message: format!("系統錯誤: {}", e),
            };
        }
    };

    // CONCEPT RUST : catch_unwind
    // - Une panic dans le fetch devient une valeur Err au lieu de tuer le thread
    // - Sans ça, l'UI attendrait un message qui n'arrivera jamais
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        runtime.block_on(fetcher.fetch(&request))
    }));

    match result {
        Ok(Ok(outcome)) => WorkerMessage::FetchSucceeded { request, outcome },
        Ok(Err(e)) => {
            error!(error = %e, "Fetch failed");
            WorkerMessage::FetchFailed {
                request,
                message: e.user_message(),
            }
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!(reason = %reason, "Fetch panicked");
            WorkerMessage::FetchFailed {
                request,
                message: format!("系統錯誤: {}", reason),
            }
        }
    }
}

/// Extrait le texte d'une panic (&str ou String)
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
