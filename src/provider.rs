use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::ScoringApi;
use crate::state::{Delta, ProviderCommand};

/// Runs provider commands until every command sender is dropped.
///
/// Each command gets its own short-lived worker so a slow prediction never holds up a
/// ratings reload; responses therefore come back in whatever order the service answers.
pub fn spawn_provider(
    api: Arc<dyn ScoringApi>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for cmd in cmd_rx {
            let api = Arc::clone(&api);
            let tx = tx.clone();
            thread::spawn(move || {
                let delta = run_command(api.as_ref(), cmd);
                // The session may be gone; a late result has no owner to update.
                let _ = tx.send(delta);
            });
        }
    })
}

pub fn run_command(api: &dyn ScoringApi, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchTeamNames => Delta::SetTeamNames(api.fetch_team_names()),
        ProviderCommand::FetchRatings { generation } => Delta::SetRatings {
            generation,
            result: api.fetch_ratings(),
        },
        ProviderCommand::FetchPrediction(ticket) => Delta::SetPrediction {
            ticket,
            result: api.fetch_prediction(&ticket.request()),
        },
    }
}
