pub mod update_video_stats;
