use std::convert::Infallible;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, JwtSessionData};

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>(SESSION_COOKIE).and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(_) => Ok(()),
            Err(e) => Err(reject::custom(e)),
        }
    })
}

pub fn with_session() -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>(SESSION_COOKIE).and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok(data),
            Err(e) => Err(reject::custom(e)),
        }
    })
}

/// Missing or invalid cookies resolve to `None` so anonymous requests pass
/// through; actions treat the absent identity as a first-class state.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Infallible> + Copy {
    warp::filters::cookie::optional::<String>(SESSION_COOKIE)
        .map(|session: Option<String>| session.and_then(|token| verify_jwt_session(token).ok()))
}
