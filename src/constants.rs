pub const USER_AGENT: &str = "Interceptarr/1.0";

pub mod tvdb {

    pub const BASE_URL: &str = "https://thetvdb.com";

    pub const SEASON_TABLE: &str = "table.table.table-bordered";

    pub const THUMBNAIL_REGION: &str = "div.col-xs-12.col-sm-4.col-md-4.col-lg-3.col-xl-2";

    pub const MISSING_THUMBNAIL: &str = "/images/missing/episode.jpg";

    pub const OVERVIEW: &str = r#"div.change_translation_text[data-language="eng"] p"#;

    pub const AIR_DATE_FORMAT: &str = "%B %d, %Y";
}

pub mod embed {

    pub const OVERVIEW_FIELD: &str = "Overview";

    pub const RELEASED_FIELD: &str = "Released";

    pub const NEW_EPISODE_AUTHOR: &str = "New Episode Now Available";

    pub const NEW_EPISODE_COLOR: u32 = 0x002E_CB6F;

    pub const CORRECTION_AUTHOR: &str = "Warning - Improper Episode Metadata";

    pub const CORRECTION_COLOR: u32 = 0x00FF_C030;

    pub const CORRECTION_DESCRIPTION: &str = "Sonarr did not have the proper metadata when importing this episode. Although the episode was successfully imported, its title and overview in Sonarr may still be incorrect or missing. \n\nSonarr will update this automatically when it fetches the correct metadata, however, __your Plex/Jellyfin metadata will need to be refreshed manually__.";

    pub const ORIGINAL_TITLE_FIELD: &str = "Original Episode Title";

    pub const NEW_TITLE_FIELD: &str = "New Episode Title";
}

pub mod limits {

    pub const DEFAULT_RELEASE_WINDOW_DAYS: u32 = 7;

    pub const MAX_RELEASE_WINDOW_DAYS: u32 = 36_500;

    pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
}
