//! Internationalization (i18n) module.
//!
//! Provides localized strings for the review prompt and CLI output.
//! English is the default language; Spanish is available as an alternative.
//! Decision keys (`d`, `s`, `q`) are the same in every language.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-', '.']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Return the ISO 639-1 code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from the `LANG` / `LC_MESSAGES` environment variables.
pub fn detect_system_lang() -> Lang {
    std::env::var("MAILTRIAGE_LANG")
        .ok()
        .and_then(|v| Lang::from_code(&v))
        .or_else(|| {
            std::env::var("LC_MESSAGES")
                .ok()
                .and_then(|v| Lang::from_code(&v))
        })
        .or_else(|| std::env::var("LANG").ok().and_then(|v| Lang::from_code(&v)))
        .unwrap_or(Lang::En)
}

/// Macro for defining translatable message functions.
/// Each function returns a `&'static str` based on the current language.
macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── General ──────────────────────────────────────────────────────

msg!(
    app_about,
    "mailtriage \u{2014} Review your largest Gmail messages and delete them one by one.",
    "mailtriage \u{2014} Revisa tus correos de Gmail m\u{e1}s grandes y b\u{f3}rralos uno a uno."
);
msg!(
    app_long_about,
    "mailtriage \u{2014} Review your largest Gmail messages and delete them one by one.\nFetches every message matching a search, sorts them by size and asks\nwhat to do with each: (d)elete, (s)kip or (q)uit.",
    "mailtriage \u{2014} Revisa tus correos de Gmail m\u{e1}s grandes y b\u{f3}rralos uno a uno.\nDescarga todos los mensajes que coinciden con una b\u{fa}squeda, los ordena\npor tama\u{f1}o y pregunta qu\u{e9} hacer con cada uno: (d) borrar, (s) saltar o (q) salir."
);
msg!(
    app_after_help,
    "The access token is read from $MAILTRIAGE_ACCESS_TOKEN or from --token (default: <config dir>/mailtriage/token.json).",
    "El token de acceso se lee de $MAILTRIAGE_ACCESS_TOKEN o de --token (por defecto: <config dir>/mailtriage/token.json)."
);

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    help_cmd_review,
    "Fetch, rank and review messages interactively (default)",
    "Descargar, ordenar y revisar mensajes de forma interactiva (por defecto)"
);
msg!(
    help_cmd_list,
    "Fetch and rank messages without reviewing them",
    "Descargar y ordenar mensajes sin revisarlos"
);
msg!(
    help_cmd_query,
    "Print the effective search query",
    "Mostrar la b\u{fa}squeda efectiva"
);
msg!(
    help_cmd_labels,
    "List the mailbox labels",
    "Listar las etiquetas del buz\u{f3}n"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar autocompletado para la shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar una p\u{e1}gina de manual"
);

// ── Review loop ──────────────────────────────────────────────────

msg!(review_message_url, "Message URL", "URL del mensaje");
msg!(review_size, "Size", "Tama\u{f1}o");
msg!(review_date, "Date", "Fecha");
msg!(review_snippet, "Snippet", "Extracto");
msg!(
    review_prompt,
    "Options: (d)elete, (s)kip, (q)uit: [s] ",
    "Opciones: (d) borrar, (s) saltar, (q) salir: [s] "
);
msg!(review_deleted, "Deleted message", "Mensaje borrado");
msg!(review_would_delete, "Would delete message", "Se borrar\u{ed}a el mensaje");
msg!(review_done, "Done.", "Hecho.");
msg!(review_processed, "messages processed", "mensajes procesados");
msg!(review_deleted_count, "deleted", "borrados");
msg!(review_dry_run, "(dry run)", "(simulaci\u{f3}n)");

// ── Fetch and listing ────────────────────────────────────────────

msg!(msg_fetching, "Fetching", "Descargando");
msg!(msg_query, "Query", "B\u{fa}squeda");
msg!(msg_labels, "Labels", "Etiquetas");
msg!(msg_no_labels, "No labels found.", "No se encontraron etiquetas.");
msg!(msg_messages, "Messages", "Mensajes");
msg!(msg_total_size, "Total size", "Tama\u{f1}o total");
msg!(msg_skipped, "Skipped", "Omitidos");
msg!(
    msg_no_messages,
    "No messages match the query.",
    "Ning\u{fa}n mensaje coincide con la b\u{fa}squeda."
);
