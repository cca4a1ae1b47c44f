use crate::api::views;
use crate::models::{ErrorResponse, JobStatusResponse};
use crate::AppState;
use log::{error, info};
use rocket::http::{Header, Status};
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{status, Flash, Redirect};
use rocket::serde::json::{json, Json, Value};
use rocket::{get, uri, Responder, State};

/// Creates a pending job, starts it in the background and sends the browser
/// to the page that polls it.
#[get("/analizar/<channel_id>")]
pub async fn start_analysis(
    channel_id: &str,
    state: &State<AppState>,
) -> Result<Redirect, ErrorResponse> {
    match state.runner.start_job(channel_id).await {
        Ok((job, _handle)) => {
            info!("Job {} queued for channel {channel_id}", job.id);
            Ok(Redirect::to(uri!(show_result(job.id.as_str()))))
        }
        Err(e) => {
            error!("Failed to create job for {channel_id}: {e}");
            Err(ErrorResponse::internal(e))
        }
    }
}

#[get("/resultado/<job_id>")]
pub fn show_result(job_id: &str) -> RawHtml<String> {
    RawHtml(views::result_page(job_id))
}

#[get("/status/<job_id>")]
pub async fn job_status(
    job_id: &str,
    state: &State<AppState>,
) -> Result<Json<JobStatusResponse>, status::Custom<Json<Value>>> {
    match state.jobs.job_status(job_id).await {
        Ok(Some((status, result))) => Ok(Json(JobStatusResponse { status, result })),
        Ok(None) => Err(status::Custom(
            Status::NotFound,
            Json(json!({ "status": "not_found" })),
        )),
        Err(e) => {
            error!("Failed to read status of job {job_id}: {e}");
            Err(status::Custom(
                Status::InternalServerError,
                Json(json!({ "status": "error", "result": e.to_string() })),
            ))
        }
    }
}

#[get("/historial")]
pub async fn history(
    state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, ErrorResponse> {
    let jobs = state.jobs.list_history().await.map_err(|e| {
        error!("Failed to load job history: {e}");
        ErrorResponse::internal(e)
    })?;
    Ok(RawHtml(views::history_page(&jobs, flash.as_ref())))
}

#[derive(Responder)]
pub enum RawDataDownload {
    #[response(content_type = "json")]
    Attachment(String, Header<'static>),
    Missing(Flash<Redirect>),
}

#[get("/descargar/<job_id>")]
pub async fn download_raw_data(
    job_id: &str,
    state: &State<AppState>,
) -> Result<RawDataDownload, ErrorResponse> {
    match state.jobs.raw_data(job_id).await {
        Ok(Some(raw)) => {
            let disposition = Header::new(
                "Content-Disposition",
                format!("attachment; filename=videos_{job_id}.json"),
            );
            Ok(RawDataDownload::Attachment(raw, disposition))
        }
        Ok(None) => Ok(RawDataDownload::Missing(Flash::error(
            Redirect::to(uri!(history)),
            "No hay datos JSON guardados para este análisis.",
        ))),
        Err(e) => {
            error!("Failed to read raw data of job {job_id}: {e}");
            Err(ErrorResponse::internal(e))
        }
    }
}
