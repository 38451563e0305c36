use std::fmt::Write;

use iva_core::types::Role;
use iva_core::view::{FormView, ViewModel};

fn form(out: &mut String, title: &str, f: &FormView) {
    let _ = writeln!(out, "== {title} ==");
    let _ = writeln!(out, "[{}]", f.submit_label);
}

/// Plain-text rendering of one screen.
pub fn format_view(view: &ViewModel) -> String {
    let mut out = String::new();
    match view {
        ViewModel::Login(f) => form(&mut out, "Login", f),
        ViewModel::Register(f) => form(&mut out, "Register", f),
        ViewModel::Conversation(c) => {
            let _ = writeln!(out, "== {} ==", c.title);
            for line in &c.lines {
                let who = match line.role {
                    Role::User => "you",
                    Role::Assistant => "iva",
                };
                if line.transient {
                    let _ = writeln!(out, "  ({})", line.text);
                } else {
                    let _ = writeln!(out, "{who}: {}", line.text);
                }
            }
            let _ = writeln!(out, "[{}]", c.mic_label);
        }
    }
    out
}
