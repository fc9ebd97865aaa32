use std::rc::Rc;

use engine::Scene;

use super::progress::SharedProgress;
use super::settings::GameSettings;

mod night;
mod office;
mod props;
mod stage;

pub(crate) use night::NightScene;
pub(crate) use office::OfficeScene;

pub(crate) fn build_scene_pair(
    settings: &GameSettings,
    progress: &SharedProgress,
) -> (Box<dyn Scene>, Box<dyn Scene>) {
    let night = NightScene::new(settings.clone(), Rc::clone(progress));
    let office = OfficeScene::new(settings.clone(), Rc::clone(progress));
    (Box::new(night), Box::new(office))
}
