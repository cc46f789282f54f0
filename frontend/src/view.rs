#![allow(clippy::wildcard_imports)]

use iodj_core::api::models::PlaylistRecord;
use iodj_core::emotion::Palette;
use iodj_core::flow::Page;
use iodj_core::types::{format_time, PlayerState};
use seed::{prelude::*, *};

use crate::{Model, Msg};

pub fn view(model: &Model) -> Node<Msg> {
    div![
        C!["content", format!("page-{}", model.nav.page().name())],
        div![C!["app-title"], "InsideOutDJ"],
        match model.nav.page() {
            Page::Login => view_login(model),
            Page::Diary => view_diary(model),
            Page::Loading => view_loading(),
            Page::Player => view_player(model),
            Page::Playlists => view_playlists(model),
        }
    ]
}

fn palette_class(prefix: &str, palette: Palette) -> String {
    format!("{prefix}-{}", palette.name())
}

fn view_login(model: &Model) -> Node<Msg> {
    if model.token.is_some() {
        div![
            C!["login"],
            button![
                C!["go-diary"],
                "Record how you feel today",
                ev(Ev::Click, |_| Msg::StartDiary)
            ],
            button![C!["logout"], "Logout", ev(Ev::Click, |_| Msg::Logout)],
        ]
    } else {
        div![
            C!["login"],
            button![
                C!["login-button"],
                "Login to Spotify",
                ev(Ev::Click, |_| Msg::Login)
            ],
        ]
    }
}

fn view_diary(model: &Model) -> Node<Msg> {
    div![
        C!["diary"],
        button![
            C!["to-playlists"],
            "Memory storage",
            ev(Ev::Click, |_| Msg::OpenPlaylists)
        ],
        h1!["How was your day?"],
        input![
            C!["diary-title"],
            attrs! {
                At::Placeholder => "Title",
                At::Value => model.diary.title,
            },
            input_ev(Ev::Input, Msg::DiaryTitleChanged),
        ],
        textarea![
            C!["diary-text"],
            attrs! {
                At::Placeholder => "Write here...",
                At::Value => model.diary.text,
            },
            input_ev(Ev::Input, Msg::DiaryTextChanged),
        ],
        button![
            C!["submit-diary"],
            "Send to memory storage",
            ev(Ev::Click, |_| Msg::SubmitDiary)
        ],
    ]
}

fn view_loading() -> Node<Msg> {
    div![
        C!["loading"],
        h1![C!["loading-text"], "On the way to your memory storage..."],
        div![C!["loading-circle"]],
    ]
}

fn view_player(model: &Model) -> Node<Msg> {
    let palette = model.clock.palette();
    let state = model.clock.state();
    let playlist = model.clock.active_playlist();
    div![
        C!["player", palette_class("bg", palette)],
        button![C!["menu-button"], "☰", ev(Ev::Click, |_| Msg::ToggleMenu)],
        IF!(model.menu_open => view_menu(model)),
        div![
            C!["playlist-name", palette_class("text", palette)],
            playlist.map_or("Nothing selected yet", |p| p.name.as_str()),
        ],
        playlist
            .and_then(|p| p.emotion)
            .map(|emotion| div![C!["emotion-label"], emotion.emotion().label()]),
        view_now_playing(state),
        view_seek(state, palette),
        view_transport(state),
        view_volume(model.volume),
        button![
            C!["to-playlists"],
            "Memory storage",
            ev(Ev::Click, |_| Msg::OpenPlaylists)
        ],
        div![C!["footer"], "Made with ❤️ by InsideOutDJ."],
    ]
}

fn view_now_playing(state: &PlayerState) -> Node<Msg> {
    match &state.current_track {
        Some(track) => div![
            C!["track"],
            track
                .cover_url()
                .map(|cover| img![C!["cover"], attrs! {At::Src => cover, At::Alt => track.name}]),
            div![
                C!["track-info"],
                div![C!["track-name"], &track.name],
                div![C!["track-artists"], track.artist_line()],
            ]
        ],
        None => div![C!["track"], "Nothing playing"],
    }
}

fn view_seek(state: &PlayerState, palette: Palette) -> Node<Msg> {
    div![
        C!["seek"],
        input![
            C!["seek-slider", palette_class("accent", palette)],
            attrs! {
                At::Type => "range",
                At::Min => 0,
                At::Max => state.duration.as_secs(),
                At::Value => state.position.as_secs(),
            },
            input_ev(Ev::Change, |value| value.parse::<u64>().ok().map(Msg::Seek)),
        ],
        div![
            C!["time"],
            span![format_time(state.position)],
            span![" / "],
            span![format_time(state.duration)],
        ],
    ]
}

fn view_transport(state: &PlayerState) -> Node<Msg> {
    div![
        C!["transport"],
        button![C!["previous"], "⏮", ev(Ev::Click, |_| Msg::SkipPrevious)],
        button![
            C!["play-pause"],
            if state.is_playing { "⏸" } else { "▶" },
            ev(Ev::Click, |_| Msg::TogglePlayPause)
        ],
        button![C!["next"], "⏭", ev(Ev::Click, |_| Msg::SkipNext)],
    ]
}

fn view_volume(volume: f32) -> Node<Msg> {
    let percent = (volume * 100.0).round() as u32;
    div![
        C!["volume"],
        input![
            attrs! {
                At::Type => "range",
                At::Min => 0,
                At::Max => 100,
                At::Value => percent,
            },
            input_ev(Ev::Input, |value| value
                .parse::<f32>()
                .ok()
                .map(|percent| Msg::SetVolume(percent / 100.0))),
        ],
    ]
}

fn view_menu(model: &Model) -> Node<Msg> {
    let (name, email) = match &model.profile {
        Some(profile) => (
            profile.display_name.as_deref().unwrap_or(&profile.id),
            profile.email.as_deref().unwrap_or("no email"),
        ),
        None => ("Guest", "not signed in"),
    };
    div![
        C!["slide-menu"],
        button![C!["menu-close"], "✕", ev(Ev::Click, |_| Msg::ToggleMenu)],
        div![
            C!["profile"],
            div![C!["profile-name"], name],
            div![C!["profile-email"], email],
        ],
        div![C!["menu-heading"], "Memory storage"],
        view_playlist_list(&model.playlists, "menu-playlist"),
        button![C!["logout"], "Logout", ev(Ev::Click, |_| Msg::Logout)],
    ]
}

fn view_playlists(model: &Model) -> Node<Msg> {
    div![
        C!["playlists"],
        button![
            C!["to-diary"],
            "Write a diary",
            ev(Ev::Click, |_| Msg::StartDiary)
        ],
        view_playlist_list(&model.playlists, "playlist-card"),
    ]
}

fn view_playlist_list(playlists: &[PlaylistRecord], item_class: &str) -> Node<Msg> {
    if playlists.is_empty() {
        return div![C!["no-playlists"], "No playlists yet."];
    }
    ul![playlists.iter().enumerate().map(|(index, playlist)| {
        li![
            C![item_class, palette_class("bg", playlist.palette())],
            div![C!["playlist-title"], &playlist.name],
            div![C!["playlist-emotion"], playlist.emotion().label()],
            div![C!["playlist-diary"], &playlist.diary_text],
            ev(Ev::Click, move |_| Msg::SelectPlaylist(index)),
        ]
    })]
}
