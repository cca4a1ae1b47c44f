//! Server-rendered pages. Deliberately plain: one stylesheet-free layout and
//! a little inline script for polling.

use crate::models::{AnalysisJob, Channel, JobStatus};
use rocket::request::FlashMessage;
use std::fmt::Write;

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, flash: Option<&FlashMessage<'_>>, body: &str) -> String {
    let flash_html = flash
        .map(|flash| {
            format!(
                r#"<p class="flash {}">{}</p>"#,
                escape(flash.kind()),
                escape(flash.message())
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/">Canales</a> | <a href="/historial">Historial</a></nav>
<h1>{title}</h1>
{flash_html}
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn index_page(channels: &[Channel], flash: Option<&FlashMessage<'_>>) -> String {
    let mut body = String::new();

    if channels.is_empty() {
        body.push_str("<p>No hay canales.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for channel in channels {
            let id = escape(&channel.channel_id);
            let _ = writeln!(
                body,
                r#"<li><a href="/analizar/{id}">{name}</a> <small>({category})</small>
<form method="post" action="/canales/{id}/borrar" style="display:inline"><button type="submit">Borrar</button></form></li>"#,
                name = escape(&channel.channel_name),
                category = escape(&channel.category),
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str(
        r#"<h2>Añadir canal</h2>
<form method="post" action="/canales">
<input name="channel_name" placeholder="Nombre del canal" required>
<input name="channel_id" placeholder="ID del canal (UC...) o URL" required>
<input name="category" placeholder="Noticias">
<button type="submit">Añadir</button>
</form>
"#,
    );

    layout("Análisis de canales", flash, &body)
}

pub fn result_page(job_id: &str) -> String {
    let body = format!(
        r#"<p id="status">Analizando... esto puede tardar hasta 2 minutos.</p>
<pre id="result" style="white-space:pre-wrap"></pre>
<script>
const statusUrl = "/status/{job_id}";
async function poll() {{
  const response = await fetch(statusUrl);
  const job = await response.json();
  if (job.status === "pending") {{
    setTimeout(poll, 3000);
    return;
  }}
  document.getElementById("status").textContent =
    job.status === "completed" ? "Análisis completado" :
    job.status === "failed" ? "El análisis falló" : "Trabajo no encontrado";
  document.getElementById("result").textContent = job.result || "";
}}
poll();
</script>
<p><a href="/descargar/{job_id}">Descargar datos (JSON)</a></p>"#,
        job_id = escape(job_id),
    );
    layout("Resultado del análisis", None, &body)
}

pub fn history_page(jobs: &[AnalysisJob], flash: Option<&FlashMessage<'_>>) -> String {
    let mut body = String::new();

    if jobs.is_empty() {
        body.push_str("<p>Todavía no hay análisis.</p>\n");
    }

    for job in jobs {
        let id = escape(&job.id);
        let download = if job.has_raw_data() {
            format!(r#" <a href="/descargar/{id}">JSON</a>"#)
        } else {
            String::new()
        };
        let result = match job.status {
            JobStatus::Pending => "En curso...".to_string(),
            _ => escape(job.result.as_deref().unwrap_or_default()),
        };

        let _ = writeln!(
            body,
            r#"<article>
<h3>{channel} <small>{created} · {status}</small></h3>
<pre style="white-space:pre-wrap">{result}</pre>
<p><a href="/resultado/{id}">Ver</a>{download}</p>
</article>"#,
            channel = escape(job.channel_name.as_deref().unwrap_or("Canal desconocido")),
            created = job.created_at.format("%Y-%m-%d %H:%M UTC"),
            status = job.status,
        );
    }

    layout("Historial", flash, &body)
}
