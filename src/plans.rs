use crate::{
    error::ApiError,
    models::{MEDIA_VIDEO, PlanLimits},
};

// The numbers come from the `get_plan_limits` database function; these checks only compare
// them against the request at hand.
impl PlanLimits {
    pub fn check_memorial_quota(&self) -> Result<(), ApiError> {
        match self.max_memorials {
            Some(max) if self.current_memorials >= i64::from(max) => {
                Err(ApiError::PlanLimit(format!(
                    "Your {} plan allows {} memorial{}. Upgrade your plan to create more.",
                    self.plan,
                    max,
                    if max == 1 { "" } else { "s" }
                )))
            }
            _ => Ok(()),
        }
    }

    /// `current_media` is the memorial's gallery size before the new item.
    pub fn check_media_quota(&self, media_type: &str, current_media: i64) -> Result<(), ApiError> {
        if media_type == MEDIA_VIDEO && !self.allow_video {
            return Err(ApiError::PlanLimit(format!(
                "Video uploads are not available on the {} plan.",
                self.plan
            )));
        }
        match self.max_photos_per_memorial {
            Some(max) if current_media >= i64::from(max) => Err(ApiError::PlanLimit(format!(
                "Your {} plan allows {} gallery items per memorial.",
                self.plan, max
            ))),
            _ => Ok(()),
        }
    }

    pub fn check_order_of_service(&self) -> Result<(), ApiError> {
        if self.allow_order_of_service {
            Ok(())
        } else {
            Err(ApiError::PlanLimit(format!(
                "Order of service programs are not available on the {} plan.",
                self.plan
            )))
        }
    }
}
