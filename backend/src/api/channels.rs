use crate::api::views;
use crate::error::StoreError;
use crate::models::{Channel, ErrorResponse, NewChannel};
use crate::utils::extract_channel_id;
use crate::AppState;
use log::{error, info};
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::{get, post, uri, State};

#[get("/")]
pub async fn index(
    state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, ErrorResponse> {
    let channels = state.channels.list_channels().await.map_err(|e| {
        error!("Failed to list channels: {e}");
        ErrorResponse::internal(e)
    })?;
    Ok(RawHtml(views::index_page(&channels, flash.as_ref())))
}

#[get("/api/canales")]
pub async fn list_channels(state: &State<AppState>) -> Result<Json<Vec<Channel>>, ErrorResponse> {
    match state.channels.list_channels().await {
        Ok(channels) => Ok(Json(channels)),
        Err(e) => {
            error!("Failed to list channels: {e}");
            Err(ErrorResponse::internal(e))
        }
    }
}

#[post("/canales", data = "<new_channel>")]
pub async fn add_channel(new_channel: Form<NewChannel>, state: &State<AppState>) -> Flash<Redirect> {
    let home = Redirect::to(uri!(index));
    let channel_name = new_channel.channel_name.trim();

    let Some(channel_id) = extract_channel_id(&new_channel.channel_id) else {
        return Flash::error(home, "Error: el ID del canal no es válido.");
    };
    if channel_name.is_empty() {
        return Flash::error(home, "Error: el nombre del canal es obligatorio.");
    }

    match state
        .channels
        .add_channel(channel_name, &channel_id, new_channel.category_or_default())
        .await
    {
        Ok(channel) => {
            info!("Channel added from web: {}", channel.channel_id);
            Flash::success(
                home,
                format!("¡Canal '{}' añadido con éxito!", channel.channel_name),
            )
        }
        Err(StoreError::DuplicateChannel(_)) => {
            Flash::error(home, "Error: Ese ID de canal ya existe en la base de datos.")
        }
        Err(e) => {
            error!("Failed to add channel {channel_id}: {e}");
            Flash::error(home, format!("Ocurrió un error: {e}"))
        }
    }
}

#[post("/canales/<channel_id>/borrar")]
pub async fn delete_channel(channel_id: &str, state: &State<AppState>) -> Flash<Redirect> {
    let home = Redirect::to(uri!(index));

    match state.channels.delete_channel(channel_id).await {
        Ok(true) => Flash::success(
            home,
            format!("¡Canal con ID '{channel_id}' borrado con éxito!"),
        ),
        Ok(false) => Flash::error(
            home,
            format!("No se encontró ningún canal con el ID '{channel_id}'."),
        ),
        Err(e) => {
            error!("Failed to delete channel {channel_id}: {e}");
            Flash::error(home, format!("Ocurrió un error: {e}"))
        }
    }
}
