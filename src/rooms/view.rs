use super::model::{Question, RoomState};
use crate::{auth::User, include_res, res::escape};

/// Inline message above the form after a submission that did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SignInRequired,
    SendFailed,
}

impl Notice {
    fn text(self) -> &'static str {
        match self {
            Notice::SignInRequired => "You have to sign in to ask a question.",
            Notice::SendFailed => "The question could not be sent. Your question was kept, try sending it again.",
        }
    }
}

/// Everything the room page shows. Rendering has no side effects.
pub struct RoomView<'a> {
    pub room_id: &'a str,
    pub state: &'a RoomState,
    pub draft: &'a str,
    pub user: Option<&'a User>,
    pub notice: Option<Notice>,
}

pub fn render(view: &RoomView) -> String {
    let room_id = escape(view.room_id);
    let room_url = super::room_url(view.room_id);
    let login_url = escape(&format!("/login?return_url={}", urlencoding::encode(&room_url)));
    let room_url = escape(&room_url);

    let user_info = match view.user {
        Some(user) => format!(
            r#"<div class="user-info"><img src="{avatar}" alt="{name}"><span>{name}</span></div>"#,
            avatar = escape(&user.avatar),
            name = escape(&user.name),
        ),
        None => format!(
            r#"<span>To send a question, <a href="{login_url}">sign in</a>.</span>"#
        ),
    };

    let notice = view
        .notice
        .map(|notice| format!(r#"<p class="notice" role="alert">{}</p>"#, notice.text()))
        .unwrap_or_default();

    include_res!(str, "/pages/rooms/room.html")
        .replace("{room_url}", &room_url)
        .replace("{room_id}", &room_id)
        .replace("{count}", &count_label(view.state.questions.len()))
        .replace("{submit_disabled}", if view.user.is_some() { "" } else { "disabled" })
        .replace("{notice}", &notice)
        .replace("{user_info}", &user_info)
        .replace("{questions}", &render_questions(&view.state.questions))
        .replace("{draft}", &escape(view.draft))
        .replace("{title}", &escape(view.state.title.as_deref().unwrap_or_default()))
}

/// Empty for an empty room.
pub fn count_label(count: usize) -> String {
    if count == 0 {
        String::new()
    } else {
        format!("{count} question(s)")
    }
}

pub fn render_questions(questions: &[Question]) -> String {
    questions
        .iter()
        .map(|question| {
            let mut classes = String::new();
            if question.is_answered {
                classes += " answered";
            }
            if question.is_highlighted {
                classes += " highlighted";
            }
            include_res!(str, "/pages/rooms/question.html")
                .replace("{classes}", &classes)
                .replace("{id}", &escape(&question.id))
                .replace("{avatar}", &escape(&question.author.avatar))
                .replace("{name}", &escape(&question.author.name))
                .replace("{content}", &escape(&question.content))
        })
        .collect()
}
