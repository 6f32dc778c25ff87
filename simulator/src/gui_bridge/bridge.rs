use crate::gui_bridge::model::{BridgeCommand, CommandReply};
use anyhow::Context;
use geodrawcore::model::{Coordinate, Drawing};
use geodrawcore::prelude::CoreError;
use geodrawcore::session::SessionHandle;
use log::{info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

fn unavailable(err: CoreError) -> Response {
    warn!("[bridge] {}", err);
    warp::reply::with_status(
        warp::reply::json(&CommandReply::Error {
            message: err.to_string(),
        }),
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .into_response()
}

async fn state(handle: SessionHandle) -> Result<Response, Infallible> {
    Ok(match handle.snapshot().await {
        Ok(snapshot) => warp::reply::json(&snapshot).into_response(),
        Err(err) => unavailable(err),
    })
}

async fn drawings(handle: SessionHandle) -> Result<Response, Infallible> {
    Ok(match handle.snapshot().await {
        Ok(snapshot) => warp::reply::json(&snapshot.drawings).into_response(),
        Err(err) => unavailable(err),
    })
}

async fn command(command: BridgeCommand, handle: SessionHandle) -> Result<Response, Infallible> {
    info!("[bridge] command {:?}", command);
    let reply = match command {
        BridgeCommand::Start => handle
            .start_capture()
            .await
            .map(|changed| CommandReply::Ok { changed }),
        BridgeCommand::Stop => handle
            .stop_capture()
            .await
            .map(|changed| CommandReply::Ok { changed }),
        BridgeCommand::Reset => handle
            .reset_capture()
            .await
            .map(|changed| CommandReply::Ok { changed }),
        BridgeCommand::Save { title } => handle
            .save(title)
            .await
            .map(|outcome| CommandReply::Saved { outcome }),
        BridgeCommand::Delete {
            title,
            latitude,
            longitude,
        } => handle
            .delete(Drawing::new(
                title,
                Coordinate::new(latitude, longitude),
                Vec::new(),
            ))
            .await
            .map(|changed| CommandReply::Ok { changed }),
        BridgeCommand::Wipe => handle
            .wipe_all()
            .await
            .map(|()| CommandReply::Ok { changed: true }),
        BridgeCommand::Radius { meters } => handle
            .set_radius(meters)
            .await
            .map(|applied_m| CommandReply::Radius { applied_m }),
        BridgeCommand::Artist { enabled } => handle
            .set_artist_mode(enabled)
            .await
            .map(|()| CommandReply::Ok { changed: true }),
    };
    Ok(match reply {
        Ok(reply) => warp::reply::json(&reply).into_response(),
        Err(err) => unavailable(err),
    })
}

/// HTTP control surface over a running session.
pub struct ControlBridge {
    handle: SessionHandle,
}

impl ControlBridge {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    pub fn routes(&self) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
        let handle = self.handle.clone();
        let handle_filter = warp::any().map(move || handle.clone());

        let state_route = warp::path("state")
            .and(warp::path::end())
            .and(warp::get())
            .and(handle_filter.clone())
            .and_then(state);

        let drawings_route = warp::path("drawings")
            .and(warp::path::end())
            .and(warp::get())
            .and(handle_filter.clone())
            .and_then(drawings);

        let command_route = warp::path("command")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter)
            .and_then(command);

        state_route.or(drawings_route).unify().or(command_route).unify()
    }

    /// Serves the routes on `addr` until `shutdown` resolves.
    pub async fn serve<F>(&self, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("binding control bridge on {}", addr))?;
        info!("[bridge] listening on http://{}", bound);
        server.await;
        Ok(())
    }
}
