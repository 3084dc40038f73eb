use serde::{Deserialize, Serialize};

use super::model::Page;

#[derive(Deserialize, Default)]
pub struct PageParams {
    page: Option<u64>,
    limit: Option<u64>,
}

impl From<PageParams> for Page {
    fn from(p: PageParams) -> Self {
        Page::new(p.page, p.limit)
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

pub(super) mod api {
    use axum::{
        Extension, Json,
        extract::{Path, Query, State},
        http::StatusCode,
    };

    use super::{MessageResponse, PageParams};
    use crate::{
        auth,
        group::{
            self,
            model::{CreateGroup, EditGroup, GroupDto, Page, Paginated},
        },
    };

    pub async fn create(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Json(params): Json<CreateGroup>,
    ) -> crate::Result<(StatusCode, Json<GroupDto>)> {
        let group = group_service.create(auth_user.id(), params).await?;
        Ok((StatusCode::CREATED, Json(group.into())))
    }

    pub async fn find_mine(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Query(params): Query<PageParams>,
    ) -> crate::Result<Json<Paginated>> {
        let page = Page::from(params);
        let groups = group_service.find_by_member(auth_user.id(), &page).await?;
        Ok(Json(groups))
    }

    pub async fn find_one(
        group_service: State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<Json<GroupDto>> {
        let group = group_service.find_by_id(&id).await?;
        Ok(Json(group.into()))
    }

    pub async fn edit(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Path(id): Path<group::Id>,
        Json(params): Json<EditGroup>,
    ) -> crate::Result<Json<GroupDto>> {
        let group = group_service.edit(auth_user.id(), &id, params).await?;
        Ok(Json(group.into()))
    }

    pub async fn delete(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<Json<MessageResponse>> {
        group_service.delete(auth_user.id(), &id).await?;
        Ok(Json(MessageResponse {
            message: "Group deleted successfully",
        }))
    }

    pub async fn join(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<Json<GroupDto>> {
        let group = group_service.join(auth_user.id(), &id).await?;
        Ok(Json(group.into()))
    }

    pub async fn leave(
        auth_user: Extension<auth::User>,
        group_service: State<group::Service>,
        Path(id): Path<group::Id>,
    ) -> crate::Result<Json<MessageResponse>> {
        group_service.leave(auth_user.id(), &id).await?;
        Ok(Json(MessageResponse {
            message: "Successfully left the group",
        }))
    }
}

pub(super) mod public {
    use axum::{
        Json,
        extract::{Query, State},
    };

    use super::PageParams;
    use crate::group::{
        self,
        model::{Page, Paginated},
    };

    pub async fn find_all(
        group_service: State<group::Service>,
        Query(params): Query<PageParams>,
    ) -> crate::Result<Json<Paginated>> {
        let page = Page::from(params);
        let groups = group_service.find_all(&page).await?;
        Ok(Json(groups))
    }
}
