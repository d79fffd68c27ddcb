use super::*;

#[test]
fn notify_kind_colors_are_distinct() {
    let kinds = [NotifyKind::Success, NotifyKind::Warn, NotifyKind::Error, NotifyKind::Info, NotifyKind::Unlock];
    for (i, a) in kinds.iter().enumerate() {
        for b in &kinds[i + 1..] {
            assert_ne!(a.color(), b.color());
        }
    }
}

#[tokio::test]
async fn fake_world_records_title_sound_chat_calls() {
    use crate::fake::FakeWorld;
    use livingworld_core::PlayerId;

    let world = FakeWorld::new();
    let player = PlayerId::new(uuid::Uuid::from_u128(1));

    world.title(player, "Level Up", "You reached level 5", NotifyKind::Success).await.unwrap();
    world.sound(player, "entity.player.levelup").await.unwrap();
    world.chat(player, "Claim protected", NotifyKind::Info).await.unwrap();

    let calls = world.notify_calls();
    assert_eq!(calls.len(), 3);
}
