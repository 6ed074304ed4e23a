//! Deterministic rendering of route records into nginx server blocks
//!
//! Pure string construction, no I/O. Identical inputs always produce
//! byte-identical output, which is what makes `regenerate_all` idempotent and
//! keeps artifact modification timestamps honest.

use crate::config::GatewaySettings;
use crate::db::RouteRecord;
use crate::error::{Result, SyncError};
use std::fmt::Write;

/// Request body size ceiling applied to every server block
const MAX_BODY_SIZE: &str = "30M";

/// Render the configuration covering the given records.
///
/// Records are re-filtered to active ones (the caller is expected to have
/// filtered already, but the renderer does not trust that) and grouped by host
/// in first-appearance order. Within a group, record order is the caller's
/// order; the renderer never reorders.
pub fn render(gateway: &GatewaySettings, records: &[RouteRecord]) -> Result<String> {
    let active: Vec<&RouteRecord> = records.iter().filter(|r| r.is_active).collect();

    let mut hosts: Vec<&str> = Vec::new();
    for record in &active {
        if !hosts.contains(&record.host.as_str()) {
            hosts.push(&record.host);
        }
    }

    let mut out = String::new();
    for (i, host) in hosts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let group: Vec<&RouteRecord> = active
            .iter()
            .filter(|r| r.host == *host)
            .copied()
            .collect();
        render_group(&mut out, gateway, host, &group)?;
    }
    Ok(out)
}

/// Render one host's server block(s). An empty record set still yields the
/// listener skeleton; that is not an error.
pub fn render_host(
    gateway: &GatewaySettings,
    host: &str,
    records: &[RouteRecord],
) -> Result<String> {
    let active: Vec<&RouteRecord> = records.iter().filter(|r| r.is_active).collect();
    let mut out = String::new();
    render_group(&mut out, gateway, host, &active)?;
    Ok(out)
}

fn render_group(
    out: &mut String,
    gateway: &GatewaySettings,
    server_name: &str,
    records: &[&RouteRecord],
) -> Result<()> {
    if server_name.is_empty() {
        return Err(SyncError::Render(
            "record has an empty host; registry invariants violated".to_string(),
        ));
    }

    // TLS requires both the flag on the group and configured cert material;
    // otherwise the group falls back to plain HTTP.
    let tls = if records.iter().any(|r| r.ssl_enabled) {
        gateway
            .ssl_certificate
            .as_ref()
            .zip(gateway.ssl_certificate_key.as_ref())
    } else {
        None
    };

    let _ = writeln!(out, "# {}.conf", server_name);
    out.push_str("server {\n");
    out.push_str("    listen 80;\n");
    let _ = writeln!(out, "    server_name {};", server_name);

    if let Some((cert, key)) = tls {
        out.push('\n');
        out.push_str("    return 301 https://$server_name$request_uri;\n");
        out.push_str("}\n");
        out.push('\n');
        out.push_str("server {\n");
        out.push_str("    listen 443 ssl;\n");
        let _ = writeln!(out, "    server_name {};", server_name);
        out.push('\n');
        let _ = writeln!(out, "    ssl_certificate {};", cert.display());
        let _ = writeln!(out, "    ssl_certificate_key {};", key.display());
        out.push_str("    ssl_protocols TLSv1.2 TLSv1.3;\n");
        out.push_str("    ssl_prefer_server_ciphers off;\n");
        out.push_str("    ssl_session_cache shared:SSL:10m;\n");
        out.push_str("    ssl_session_timeout 10m;\n");
    }

    out.push('\n');
    let _ = writeln!(out, "    client_max_body_size {};", MAX_BODY_SIZE);

    for record in records {
        out.push('\n');
        let _ = writeln!(out, "    # {}", record.name);
        let _ = writeln!(out, "    location /{}/ {{", record.path);
        let _ = writeln!(
            out,
            "        proxy_pass http://{}:{}/;",
            record.host, record.port
        );
        out.push_str("        proxy_set_header Host $host;\n");
        out.push_str("        proxy_set_header X-Real-IP $remote_addr;\n");
        out.push_str("        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n");
        out.push_str("        proxy_set_header X-Forwarded-Proto $scheme;\n");
        out.push_str("        proxy_redirect off;\n");
        out.push_str("    }\n");
        out.push('\n');
        let _ = writeln!(out, "    location /{}/static/ {{", record.path);
        let _ = writeln!(out, "        alias {}/;", record.static_root);
        out.push_str("        expires 1d;\n");
        out.push_str("        add_header Cache-Control \"public, max-age=86400\";\n");
        out.push_str("    }\n");
        out.push('\n');
        let _ = writeln!(out, "    location /{}/media/ {{", record.path);
        let _ = writeln!(out, "        alias {}/media/;", record.static_root);
        out.push_str("        expires 7d;\n");
        out.push_str("        add_header Cache-Control \"public, max-age=604800\";\n");
        out.push_str("    }\n");
    }

    out.push('\n');
    // Never serve dotfiles (.env, .git, .htaccess, ...)
    out.push_str("    location ~ /\\. {\n");
    out.push_str("        deny all;\n");
    out.push_str("    }\n");
    out.push_str("}\n");

    Ok(())
}
