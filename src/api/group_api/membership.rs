// ==========================================
// GroupApi - 成员生命周期
// ==========================================

use super::*;

impl GroupApi {
    /// 按小组ID加入
    #[instrument(skip(self))]
    pub fn join(&self, group_id: &str, student_id: &str) -> ApiResult<GroupDetail> {
        require_id("小组ID", group_id)?;
        require_id("学生ID", student_id)?;
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            // 持有写锁后取时间，记录顺序与提交顺序一致
            let now = Utc::now();
            let group = GroupRepository::new(tx).get(group_id)?;
            self.join_in_tx(tx, group, student_id, now)
        })?;

        info!(group_id = %detail.group.group_id, count = detail.capacity.count, "学生已加入小组");
        Ok(detail)
    }

    /// 按邀请码加入
    ///
    /// 邀请码先规范化（去空白、转大写）；格式错误返回 InvalidInput，
    /// 查无此码返回 NotFound
    #[instrument(skip(self))]
    pub fn join_by_code(&self, invite_code: &str, student_id: &str) -> ApiResult<GroupDetail> {
        require_id("学生ID", student_id)?;
        let code = InviteCodeIssuer::normalize(invite_code);
        if !InviteCodeIssuer::is_well_formed(&code) {
            return Err(ApiError::InvalidInput(format!("邀请码格式错误: {}", invite_code)));
        }
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            let now = Utc::now();
            let group = GroupRepository::new(tx)
                .find_by_invite_code(&code)?
                .ok_or_else(|| ApiError::NotFound(format!("邀请码{}不存在", code)))?;
            self.join_in_tx(tx, group, student_id, now)
        })?;

        info!(group_id = %detail.group.group_id, count = detail.capacity.count, "学生已通过邀请码加入小组");
        Ok(detail)
    }

    fn join_in_tx(
        &self,
        tx: &Connection,
        group: Group,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<GroupDetail> {
        let assignment = AssignmentRepository::new(tx).get(&group.assignment_id)?;
        ensure_enrolled(tx, &assignment, student_id)?;

        let members = GroupMemberRepository::new(tx);
        let existing = members.find_for_student(&group.assignment_id, student_id)?;
        let count = members.count_by_group(&group.group_id)?;
        self.rules.check_join(
            &group,
            &assignment.config,
            student_id,
            existing.as_ref(),
            count,
            now,
        )?;

        let at = now.naive_utc();
        add_member(tx, &group, student_id, MemberRole::Member, at)?;
        emit_system(
            tx,
            &group.group_id,
            student_id,
            format!("{} 加入了小组", student_id),
            at,
        )?;
        load_detail(tx, group, &assignment.config)
    }

    /// 退出小组
    ///
    /// # 返回
    /// - Left: 普通成员退出
    /// - LeadershipHandedOff: 组长退出，组长移交给最早加入的剩余成员
    /// - Dissolved: 最后一名成员退出，小组及其消息被删除
    #[instrument(skip(self))]
    pub fn leave(&self, group_id: &str, student_id: &str) -> ApiResult<LeaveOutcome> {
        require_id("小组ID", group_id)?;
        require_id("学生ID", student_id)?;
        let outcome = self.store.write(|tx| -> ApiResult<LeaveOutcome> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            let members = GroupMemberRepository::new(tx);
            let current = members.find_by_group(group_id)?;
            let plan = self
                .rules
                .plan_leave(&group, &assignment.config, &current, student_id)?;

            match plan {
                LeavePlan::RemoveMember => {
                    members.delete(group_id, student_id)?;
                    emit_system(tx, group_id, student_id, format!("{} 退出了小组", student_id), at)?;
                    Ok(LeaveOutcome::Left)
                }
                LeavePlan::HandOffLeadership { new_leader_id } => {
                    // 先删旧组长，再提升新组长，保持每组至多一个 LEADER
                    members.delete(group_id, student_id)?;
                    members.update_role(group_id, &new_leader_id, MemberRole::Leader)?;
                    GroupRepository::new(tx).update_leader(group_id, &new_leader_id)?;
                    emit_system(
                        tx,
                        group_id,
                        student_id,
                        format!("{} 退出了小组，{} 成为新组长", student_id, new_leader_id),
                        at,
                    )?;
                    Ok(LeaveOutcome::LeadershipHandedOff { new_leader_id })
                }
                LeavePlan::DissolveGroup => {
                    GroupRepository::new(tx).delete(group_id)?;
                    Ok(LeaveOutcome::Dissolved)
                }
            }
        })?;

        info!(outcome = ?outcome, "学生已退出小组");
        Ok(outcome)
    }

    /// 组长移除成员
    #[instrument(skip(self))]
    pub fn remove_member(
        &self,
        group_id: &str,
        leader_id: &str,
        target_id: &str,
    ) -> ApiResult<GroupDetail> {
        require_id("小组ID", group_id)?;
        require_id("组长ID", leader_id)?;
        require_id("学生ID", target_id)?;
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            let members = GroupMemberRepository::new(tx);
            let target = members.find_member(group_id, target_id)?;
            self.rules
                .check_remove(&group, leader_id, target_id, target.as_ref())?;

            members.delete(group_id, target_id)?;
            emit_system(
                tx,
                group_id,
                leader_id,
                format!("{} 被组长移出小组", target_id),
                at,
            )?;
            load_detail(tx, group, &assignment.config)
        })?;

        info!(count = detail.capacity.count, "成员已被移除");
        Ok(detail)
    }

    /// 组长移交
    #[instrument(skip(self))]
    pub fn transfer_leader(
        &self,
        group_id: &str,
        leader_id: &str,
        new_leader_id: &str,
    ) -> ApiResult<GroupDetail> {
        require_id("小组ID", group_id)?;
        require_id("组长ID", leader_id)?;
        require_id("新组长ID", new_leader_id)?;
        let detail = self.store.write(|tx| -> ApiResult<GroupDetail> {
            let at = Utc::now().naive_utc();
            let (group, assignment) = load_group_context(tx, group_id)?;
            let members = GroupMemberRepository::new(tx);
            let target = members.find_member(group_id, new_leader_id)?;
            self.rules
                .check_transfer(&group, leader_id, new_leader_id, target.as_ref())?;

            // 先降级再提升，唯一组长索引不会冲突
            members.update_role(group_id, leader_id, MemberRole::Member)?;
            members.update_role(group_id, new_leader_id, MemberRole::Leader)?;
            let groups = GroupRepository::new(tx);
            groups.update_leader(group_id, new_leader_id)?;
            emit_system(
                tx,
                group_id,
                leader_id,
                format!("{} 将组长移交给 {}", leader_id, new_leader_id),
                at,
            )?;
            load_detail(tx, groups.get(group_id)?, &assignment.config)
        })?;

        info!(new_leader_id, "组长已移交");
        Ok(detail)
    }

    /// 组长解散小组（成员与消息级联删除）
    #[instrument(skip(self))]
    pub fn dissolve(&self, group_id: &str, leader_id: &str) -> ApiResult<()> {
        require_id("小组ID", group_id)?;
        require_id("组长ID", leader_id)?;

        self.store.write(|tx| -> ApiResult<()> {
            let groups = GroupRepository::new(tx);
            let group = groups.get(group_id)?;
            self.rules.check_dissolve(&group, leader_id)?;
            groups.delete(group_id)?;
            Ok(())
        })?;

        info!("小组已解散");
        Ok(())
    }
}
