// ==========================================
// 小组生命周期集成测试
// ==========================================
// 覆盖: 创建 / 加入 / 邀请码 / 退出与组长移交 / 移除 / 解散 / 锁定 / 截止时间
// ==========================================


#[cfg(test)]
mod group_lifecycle_test {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use group_formation::api::{ApiError, ApiResult, ErrorKind, GroupApi};
    use group_formation::config::config_keys;
    use group_formation::domain::types::{GroupStatus, MemberRole, MessageType};
    use group_formation::domain::LeaveOutcome;
    use group_formation::engine::{InviteCodeIssuer, InviteCodeSource, RuleViolation};
    use rusqlite::params;

    use crate::test_helpers::{
        leader_count, seed_assignment, setup_env, student, with_conn, ASSIGNMENT_ID, CLASS_ID,
        TEACHER_ID,
    };

    const CONFIG_2_4: &str = r#"{"minSize": 2, "maxSize": 4}"#;

    fn rule_of<T: std::fmt::Debug>(result: ApiResult<T>) -> RuleViolation {
        match result {
            Err(ApiError::Rule(rule)) => rule,
            other => panic!("expected rule violation, got {:?}", other),
        }
    }

    fn kind_of<T: std::fmt::Debug>(result: ApiResult<T>) -> ErrorKind {
        match result {
            Err(err) => err.kind(),
            Ok(v) => panic!("expected error, got {:?}", v),
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    #[test]
    fn test_create_group_makes_creator_sole_leader() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;

        let detail = api.create_group(ASSIGNMENT_ID, &student(1), "  星火队 ").unwrap();
        assert_eq!(detail.group.name, "星火队");
        assert_eq!(detail.group.status, GroupStatus::Forming);
        assert_eq!(detail.group.leader_id, student(1));
        assert!(InviteCodeIssuer::is_well_formed(&detail.group.invite_code));
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.members[0].role, MemberRole::Leader);
        assert_eq!(detail.capacity.count, 1);
        assert_eq!(detail.capacity.max, 4);

        // 创建产生一条 SYSTEM 消息
        let page = env
            .state
            .message_api
            .list(&detail.group.group_id, &student(1), 1, 20)
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.messages[0].message_type, MessageType::System);

        let mine = api.find_my_group(ASSIGNMENT_ID, &student(1)).unwrap().unwrap();
        assert_eq!(mine.group.group_id, detail.group.group_id);
        assert!(api.find_my_group(ASSIGNMENT_ID, &student(2)).unwrap().is_none());
    }

    #[test]
    fn test_create_group_rejections() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        api.create_group(ASSIGNMENT_ID, &student(1), "一组").unwrap();

        // 已在组内
        let rule = rule_of(api.create_group(ASSIGNMENT_ID, &student(1), "二组"));
        assert!(matches!(rule, RuleViolation::AlreadyGrouped { .. }));

        // 不在班级
        let err = api.create_group(ASSIGNMENT_ID, "OUTSIDER", "三组");
        assert_eq!(kind_of(err), ErrorKind::Forbidden);

        // 名称非法
        assert_eq!(
            kind_of(api.create_group(ASSIGNMENT_ID, &student(2), "   ")),
            ErrorKind::Validation
        );

        // 非分组作业
        with_conn(&env.db_path, |conn| {
            seed_assignment(conn, "A2", CLASS_ID, "INDIVIDUAL", "").unwrap();
        });
        let rule = rule_of(api.create_group("A2", &student(2), "个人"));
        assert!(matches!(rule, RuleViolation::AssignmentNotGroupType { .. }));

        // 作业不存在
        assert_eq!(
            kind_of(api.create_group("NOPE", &student(2), "无")),
            ErrorKind::NotFound
        );
    }

    // ==========================================
    // 加入
    // ==========================================

    #[test]
    fn test_join_until_capacity_full() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 3}"#, 5);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "满员组")
            .unwrap()
            .group
            .group_id;

        api.join(&group_id, &student(2)).unwrap();
        let detail = api.join(&group_id, &student(3)).unwrap();
        assert_eq!(detail.capacity.count, 3);
        assert!(detail.capacity.is_full());

        let rule = rule_of(api.join(&group_id, &student(4)));
        assert!(matches!(rule, RuleViolation::CapacityFull { count: 3, max: 3, .. }));

        // 重复加入
        let rule = rule_of(api.join(&group_id, &student(2)));
        assert!(matches!(rule, RuleViolation::AlreadyGrouped { .. }));

        assert_eq!(api.capacity_of(&group_id).unwrap().count, 3);
    }

    #[test]
    fn test_join_by_code_normalizes_input() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group = api.create_group(ASSIGNMENT_ID, &student(1), "码组").unwrap().group;

        let typed = format!("  {} ", group.invite_code.to_lowercase());
        let detail = api.join_by_code(&typed, &student(2)).unwrap();
        assert_eq!(detail.members.len(), 2);

        assert_eq!(
            kind_of(api.join_by_code("HELLO", &student(3))),
            ErrorKind::Validation
        );

        let unknown = if group.invite_code == "SL-2222" { "SL-3333" } else { "SL-2222" };
        assert_eq!(
            kind_of(api.join_by_code(unknown, &student(3))),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_deadline_blocks_students_but_not_teacher() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "截止组")
            .unwrap()
            .group
            .group_id;

        with_conn(&env.db_path, |conn| {
            conn.execute(
                "UPDATE assignment SET group_config = ?1 WHERE assignment_id = ?2",
                params![
                    r#"{"minSize": 2, "maxSize": 4, "groupDeadline": "2020-01-01T00:00:00Z"}"#,
                    ASSIGNMENT_ID
                ],
            )
            .unwrap();
        });

        let rule = rule_of(api.join(&group_id, &student(2)));
        assert!(matches!(rule, RuleViolation::GroupDeadlinePassed { .. }));
        let rule = rule_of(api.create_group(ASSIGNMENT_ID, &student(3), "迟到组"));
        assert!(matches!(rule, RuleViolation::GroupDeadlinePassed { .. }));

        // 教师手动分配不受截止限制
        let detail = api.assign_student(&group_id, TEACHER_ID, &student(2)).unwrap();
        assert_eq!(detail.members.len(), 2);
    }

    // ==========================================
    // 退出与组长移交
    // ==========================================

    #[test]
    fn test_transfer_then_member_leaves() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let (a, b, c) = (student(1), student(2), student(3));
        let group_id = api.create_group(ASSIGNMENT_ID, &a, "移交组").unwrap().group.group_id;
        api.join(&group_id, &b).unwrap();
        api.join(&group_id, &c).unwrap();

        let detail = api.transfer_leader(&group_id, &a, &c).unwrap();
        assert_eq!(detail.group.leader_id, c);

        let outcome = api.leave(&group_id, &b).unwrap();
        assert_eq!(outcome, LeaveOutcome::Left);

        let detail = api.get_group_detail(&group_id).unwrap();
        assert_eq!(detail.group.leader_id, c);
        assert_eq!(detail.members.len(), 2);
        let a_member = detail.members.iter().find(|m| m.student_id == a).unwrap();
        assert_eq!(a_member.role, MemberRole::Member);
        assert_eq!(detail.leader().unwrap().student_id, c);
        assert_eq!(leader_count(&env.db_path, &group_id), 1);
    }

    #[test]
    fn test_leader_leave_hands_off_to_earliest_joined() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "接班组")
            .unwrap()
            .group
            .group_id;
        api.join(&group_id, &student(3)).unwrap();
        api.join(&group_id, &student(2)).unwrap();

        let outcome = api.leave(&group_id, &student(1)).unwrap();
        assert_eq!(
            outcome,
            LeaveOutcome::LeadershipHandedOff {
                new_leader_id: student(3)
            }
        );

        let detail = api.get_group_detail(&group_id).unwrap();
        assert_eq!(detail.group.leader_id, student(3));
        assert_eq!(detail.leader().unwrap().student_id, student(3));
        assert_eq!(leader_count(&env.db_path, &group_id), 1);

        // 退出的学生可以重新加入其他小组
        assert!(api
            .find_my_group(ASSIGNMENT_ID, &student(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sole_member_leave_deletes_group() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "独行组")
            .unwrap()
            .group
            .group_id;
        env.state
            .message_api
            .post(&group_id, &student(1), "有人吗")
            .unwrap();

        assert_eq!(api.leave(&group_id, &student(1)).unwrap(), LeaveOutcome::Dissolved);
        assert_eq!(kind_of(api.get_group_detail(&group_id)), ErrorKind::NotFound);
        assert_eq!(kind_of(api.join(&group_id, &student(2))), ErrorKind::NotFound);

        // 消息级联删除
        let remaining: i64 = with_conn(&env.db_path, |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM group_message WHERE group_id = ?1",
                params![group_id],
                |row| row.get(0),
            )
            .unwrap()
        });
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_leave_rejections() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 4, "allowSwitch": false}"#, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "固定组")
            .unwrap()
            .group
            .group_id;
        api.join(&group_id, &student(2)).unwrap();

        let rule = rule_of(api.leave(&group_id, &student(2)));
        assert!(matches!(rule, RuleViolation::SwitchNotAllowed { .. }));
        assert_eq!(api.capacity_of(&group_id).unwrap().count, 2);
    }

    // ==========================================
    // 组长操作
    // ==========================================

    #[test]
    fn test_remove_member_rules() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "纪律组")
            .unwrap()
            .group
            .group_id;
        api.join(&group_id, &student(2)).unwrap();
        api.join(&group_id, &student(3)).unwrap();

        let rule = rule_of(api.remove_member(&group_id, &student(2), &student(3)));
        assert!(matches!(rule, RuleViolation::NotLeader { .. }));
        assert_eq!(rule_of(api.remove_member(&group_id, &student(1), &student(1))), RuleViolation::SelfRemoval);
        let rule = rule_of(api.remove_member(&group_id, &student(1), &student(4)));
        assert!(matches!(rule, RuleViolation::NotAMember { .. }));

        let detail = api.remove_member(&group_id, &student(1), &student(3)).unwrap();
        assert_eq!(detail.member_ids(), vec![student(1), student(2)]);
        assert!(api.find_my_group(ASSIGNMENT_ID, &student(3)).unwrap().is_none());
    }

    #[test]
    fn test_transfer_rejections() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "移交组")
            .unwrap()
            .group
            .group_id;
        api.join(&group_id, &student(2)).unwrap();

        let rule = rule_of(api.transfer_leader(&group_id, &student(1), &student(1)));
        assert!(matches!(rule, RuleViolation::NoOpTransfer { .. }));
        let rule = rule_of(api.transfer_leader(&group_id, &student(1), &student(3)));
        assert!(matches!(rule, RuleViolation::NotAMember { .. }));
        let rule = rule_of(api.transfer_leader(&group_id, &student(2), &student(1)));
        assert!(matches!(rule, RuleViolation::NotLeader { .. }));
    }

    #[test]
    fn test_dissolve_by_leader() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "解散组")
            .unwrap()
            .group
            .group_id;
        api.join(&group_id, &student(2)).unwrap();

        assert_eq!(kind_of(api.dissolve(&group_id, &student(2))), ErrorKind::Forbidden);
        api.dissolve(&group_id, &student(1)).unwrap();

        assert!(api.list_groups(ASSIGNMENT_ID).unwrap().is_empty());
        assert_eq!(api.get_unassigned(ASSIGNMENT_ID).unwrap().len(), 4);
    }

    // ==========================================
    // 教师锁定
    // ==========================================

    #[test]
    fn test_lock_freezes_membership() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = &env.state.group_api;
        let g1 = api.create_group(ASSIGNMENT_ID, &student(1), "一组").unwrap().group.group_id;
        let g2 = api.create_group(ASSIGNMENT_ID, &student(2), "二组").unwrap().group.group_id;

        let rule = rule_of(api.lock_group(&g1, &student(3)));
        assert!(matches!(rule, RuleViolation::NotOwner { .. }));

        let locked = api.lock_group(&g1, TEACHER_ID).unwrap();
        assert_eq!(locked.status, GroupStatus::Locked);

        let rule = rule_of(api.join(&g1, &student(3)));
        assert!(matches!(rule, RuleViolation::GroupLocked { .. }));
        let rule = rule_of(api.leave(&g1, &student(1)));
        assert!(matches!(rule, RuleViolation::GroupLocked { .. }));

        match api.lock_group(&g1, TEACHER_ID) {
            Err(err @ ApiError::InvalidStateTransition { .. }) => {
                assert_eq!(err.kind(), ErrorKind::Conflict)
            }
            other => panic!("expected InvalidStateTransition, got {:?}", other),
        }

        // 批量锁定只处理 FORMING 小组
        assert_eq!(api.lock_all(ASSIGNMENT_ID, TEACHER_ID).unwrap(), 1);
        assert_eq!(api.get_group_detail(&g2).unwrap().group.status, GroupStatus::Locked);
        assert_eq!(api.lock_all(ASSIGNMENT_ID, TEACHER_ID).unwrap(), 0);
    }

    #[test]
    fn test_assign_student_rules() {
        let env = setup_env(r#"{"minSize": 1, "maxSize": 2}"#, 4);
        let api = &env.state.group_api;
        let group_id = api
            .create_group(ASSIGNMENT_ID, &student(1), "分配组")
            .unwrap()
            .group
            .group_id;

        let rule = rule_of(api.assign_student(&group_id, &student(2), &student(3)));
        assert!(matches!(rule, RuleViolation::NotOwner { .. }));
        let rule = rule_of(api.assign_student(&group_id, TEACHER_ID, "OUTSIDER"));
        assert!(matches!(rule, RuleViolation::NotInClass { .. }));

        api.assign_student(&group_id, TEACHER_ID, &student(2)).unwrap();
        let rule = rule_of(api.assign_student(&group_id, TEACHER_ID, &student(3)));
        assert!(matches!(rule, RuleViolation::CapacityFull { .. }));
    }

    // ==========================================
    // 邀请码冲突重试
    // ==========================================

    struct ScriptedCodes {
        codes: Mutex<VecDeque<String>>,
        fallback: String,
    }

    impl ScriptedCodes {
        fn new(codes: &[&str], fallback: &str) -> Self {
            Self {
                codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
                fallback: fallback.to_string(),
            }
        }
    }

    impl InviteCodeSource for ScriptedCodes {
        fn next_code(&self) -> String {
            self.codes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    #[test]
    fn test_invite_code_collision_is_retried() {
        let env = setup_env(CONFIG_2_4, 4);
        let api = GroupApi::new(env.state.store.clone(), env.state.config_manager.clone())
            .with_invite_code_source(Arc::new(ScriptedCodes::new(
                &["SL-AAAA", "SL-AAAA", "SL-BBBB"],
                "SL-CCCC",
            )));

        let first = api.create_group(ASSIGNMENT_ID, &student(1), "一组").unwrap();
        let second = api.create_group(ASSIGNMENT_ID, &student(2), "二组").unwrap();
        assert_eq!(first.group.invite_code, "SL-AAAA");
        assert_eq!(second.group.invite_code, "SL-BBBB");
    }

    #[test]
    fn test_invite_code_exhaustion_rolls_back() {
        let env = setup_env(CONFIG_2_4, 4);
        env.state
            .config_manager
            .set_value(config_keys::INVITE_CODE_MAX_ATTEMPTS, "3")
            .unwrap();
        let api = GroupApi::new(env.state.store.clone(), env.state.config_manager.clone())
            .with_invite_code_source(Arc::new(ScriptedCodes::new(&[], "SL-AAAA")));

        api.create_group(ASSIGNMENT_ID, &student(1), "一组").unwrap();
        match api.create_group(ASSIGNMENT_ID, &student(2), "二组") {
            Err(ApiError::InviteCodeExhausted { attempts }) => assert_eq!(attempts, 3),
            other => panic!("expected InviteCodeExhausted, got {:?}", other),
        }

        // 事务回滚，学生仍未分组
        assert!(api.find_my_group(ASSIGNMENT_ID, &student(2)).unwrap().is_none());
        assert_eq!(api.list_groups(ASSIGNMENT_ID).unwrap().len(), 1);
    }
}
