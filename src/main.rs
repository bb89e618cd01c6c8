use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info};
use crate::assistant::logic::{AssistantBackend, ChatPanel};
use crate::context::domain::AppContext;
use crate::metric::threshold::Metric;
use crate::poll::logic::start_poll;
use crate::push::logic::connect;
use crate::system::domain::{init_tracing, FarmError, System};
use crate::view::logic::{compose, start_render};

mod assistant;
mod config;
mod context;
mod device;
mod metric;
mod poll;
mod push;
mod state;
mod system;
mod view;

#[cfg(test)]
mod test_support;


#[tokio::main]
async fn main() -> Result<(), FarmError> {

    let system = System::new()?;
    init_tracing(&system);

    let app_context = AppContext::new(system)?;
    info!("Info: tablero iniciado contra {} (asistente: {})",
          app_context.system.api_url, app_context.system.assistant_mode);

    let mut poll = start_poll(&app_context);

    let mut push = connect(&app_context.system.push_url(),
                           app_context.state.clone());

    let (view_tx, view_rx) = watch::channel(compose(&app_context.state.snapshot()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let render = start_render(app_context.state.clone(),
                              view_tx,
                              shutdown_rx);

    let mut chat = ChatPanel::new(AssistantBackend::from_context(&app_context));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Info: señal de apagado recibida");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(question)) => {
                        if let Some(reply) = chat.submit(&question).await {
                            println!("[{:?}] {}", reply.role, reply.text);
                        }
                    }
                    Ok(None) => {
                        // stdin cerrado: seguir hasta Ctrl-C.
                        let _ = tokio::signal::ctrl_c().await;
                        break;
                    }
                    Err(e) => {
                        error!("Error: leyendo stdin {e}");
                        let _ = tokio::signal::ctrl_c().await;
                        break;
                    }
                }
            }
        }
    }

    {
        let view = view_rx.borrow();
        info!("Info: última vista: temperatura {:?}, alertas {:?}, dispositivos {:?}, canal push {:?}",
              view.card(Metric::Temperature).and_then(|c| c.value),
              view.alerts,
              view.devices,
              push.status());
    }

    poll.stop();
    push.disconnect();
    let _ = shutdown_tx.send(true);
    if let Err(e) = render.await {
        error!("Error: render task {e}");
    }

    info!("Info: tablero finalizado");
    Ok(())
}
