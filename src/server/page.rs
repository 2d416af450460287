//! Landing page markup.
//!
//! A fixed, self-contained document: no templating, no external assets,
//! no reflected input. The only interactive element is the single form
//! posting to the crash endpoint.

pub const PAGE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Crash Test App</title>
    <style>
        body {
            font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
            background: #f9fafb;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            margin: 0;
            padding: 1rem;
        }
        .card {
            background: #ffffff;
            padding: 2.5rem;
            border-radius: 0.75rem;
            box-shadow: 0 20px 40px rgba(0, 0, 0, 0.15);
            max-width: 32rem;
            width: 100%;
            text-align: center;
        }
        h1 { color: #dc2626; margin-top: 0; }
        p.description { color: #4b5563; margin-bottom: 2rem; }
        button {
            width: 100%;
            padding: 0.75rem 1.5rem;
            font-size: 1.125rem;
            font-weight: 600;
            color: #ffffff;
            background: #ef4444;
            border: none;
            border-radius: 0.5rem;
            cursor: pointer;
        }
        button:hover { background: #dc2626; }
        button:disabled { background: #f87171; cursor: not-allowed; }
        #loadingMessage { margin-top: 1rem; color: #ef4444; font-weight: 500; display: none; }
        .footer {
            margin-top: 2rem;
            padding-top: 1.5rem;
            border-top: 1px solid #f3f4f6;
            font-size: 0.875rem;
            color: #9ca3af;
        }
        .footer code {
            font-size: 0.75rem;
            color: #22c55e;
            background: #f0fdf4;
            border-radius: 0.375rem;
            padding: 0.125rem 0.25rem;
        }
    </style>
</head>
<body>
    <div class="card">
        <h1>Crash Test App</h1>
        <p class="description">
            This application intentionally raises an unhandled fault when the
            button below is pressed. The resulting exception telemetry event
            exercises the monitoring pipeline end-to-end and should fire the
            configured alert.
        </p>

        <form method="POST" action="/crash">
            <button type="submit" id="crashButton">Trigger Critical Crash</button>
        </form>

        <p id="loadingMessage">
            Crash initiated... the system is intentionally failing. Check the
            monitoring backend!
        </p>

        <div class="footer">
            Monitoring status:
            <code>telemetry export configured via environment variable</code>
        </div>
    </div>
    <script>
        document.getElementById('crashButton').addEventListener('click', function () {
            this.disabled = true;
            this.textContent = 'Crashing...';
            document.getElementById('loadingMessage').style.display = 'block';
        });
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_contains_exactly_one_form_targeting_the_crash_path() {
        assert_eq!(PAGE_HTML.matches("<form").count(), 1);
        assert!(PAGE_HTML.contains(r#"action="/crash""#));
        assert!(PAGE_HTML.contains(r#"method="POST""#));
    }

    #[test]
    fn page_is_self_contained() {
        assert!(!PAGE_HTML.contains("http://"));
        assert!(!PAGE_HTML.contains("https://"));
        assert!(!PAGE_HTML.contains("src="));
    }
}
