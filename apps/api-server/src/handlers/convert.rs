//! Domain → DTO conversions.

use chrono::{DateTime, Utc};

use notepad_core::Page;
use notepad_core::domain::{Chord, ChordDiagram, User};
use notepad_core::services::AuthSession;
use notepad_shared::PagedResponse;
use notepad_shared::dto::{
    AuthResponse, BarreResponse, ChordResponse, DiagramResponse, DotResponse, UserResponse,
};

pub fn user_response(user: &User, now: DateTime<Utc>) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        blocked_until: user.blocked_until,
        is_blocked: user.is_blocked(now),
        created_at: user.created_at,
    }
}

pub fn auth_response(session: &AuthSession, now: DateTime<Utc>) -> AuthResponse {
    AuthResponse {
        access_token: session.token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in.max(0) as u64,
        user: user_response(&session.user, now),
    }
}

pub fn chord_response(chord: &Chord) -> ChordResponse {
    ChordResponse {
        id: chord.id,
        author_id: chord.author_id,
        name: chord.name.clone(),
        fingering: chord.fingering.to_string(),
        description: chord.description.clone(),
        created_at: chord.created_at,
        updated_at: chord.updated_at,
    }
}

pub fn diagram_response(diagram: &ChordDiagram) -> DiagramResponse {
    DiagramResponse {
        fingering: diagram.fingering.to_string(),
        base_fret: diagram.base_fret,
        fret_count: diagram.fret_count,
        muted: diagram.muted.clone(),
        open: diagram.open.clone(),
        dots: diagram
            .dots
            .iter()
            .map(|dot| DotResponse {
                string: dot.string,
                fret: dot.fret,
            })
            .collect(),
        barre: diagram.barre.map(|barre| BarreResponse {
            fret: barre.fret,
            first_string: barre.first_string,
            last_string: barre.last_string,
        }),
    }
}

pub fn paged<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PagedResponse<U> {
    let page = page.map(f);
    PagedResponse {
        items: page.items,
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}
